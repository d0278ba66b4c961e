//! Log level definitions

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered severity levels.
///
/// `Print` is the level-less pseudo-level sitting below `Trace`; it renders
/// without a level tag and is meant for output that should carry no severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Print = 0,
    Trace = 1,
    #[default]
    Debug = 2,
    Info = 3,
    Warn = 4,
    Error = 5,
    Fatal = 6,
}

impl Level {
    /// Parse a level name, case-insensitively, accepting common aliases.
    ///
    /// Unrecognized input falls back to `Debug`. The fallback is deliberate:
    /// a typo in a config file should widen the output, not break startup.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "print" => Level::Print,
            "trc" | "trace" => Level::Trace,
            "dbg" | "debug" => Level::Debug,
            "inf" | "info" | "information" => Level::Info,
            "wrn" | "warn" | "warning" => Level::Warn,
            "err" | "error" => Level::Error,
            "ftl" | "fatal" => Level::Fatal,
            _ => Level::Debug,
        }
    }

    /// Lowercase level name, as stored in the remote schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Print => "print",
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Three-letter tag used by the text sinks. Empty for `Print`.
    pub fn tag(&self) -> &'static str {
        match self {
            Level::Print => "",
            Level::Trace => "TRC",
            Level::Debug => "DBG",
            Level::Info => "INF",
            Level::Warn => "WRN",
            Level::Error => "ERR",
            Level::Fatal => "FTL",
        }
    }

    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Level::Print => White,
            Level::Trace => BrightBlack,
            Level::Debug => Blue,
            Level::Info => Green,
            Level::Warn => Yellow,
            Level::Error => Red,
            Level::Fatal => BrightRed,
        }
    }

    /// Tag wrapped in the level's terminal color. For terminal sinks only.
    pub fn colorized_tag(&self) -> String {
        self.tag().color(self.color_code()).to_string()
    }

    /// Threshold rule: admitted when at or above `min`, with an independent
    /// override that force-admits `Debug` regardless of the threshold.
    #[inline]
    pub fn admits(&self, min: Level, force_debug: bool) -> bool {
        *self >= min || (*self == Level::Debug && force_debug)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_matches_severity() {
        assert!(Level::Print < Level::Trace);
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Level::parse("dbg"), Level::Debug);
        assert_eq!(Level::parse("Debug"), Level::Debug);
        assert_eq!(Level::parse("INFORMATION"), Level::Info);
        assert_eq!(Level::parse("wrn"), Level::Warn);
        assert_eq!(Level::parse("Warning"), Level::Warn);
        assert_eq!(Level::parse("err"), Level::Error);
        assert_eq!(Level::parse("ftl"), Level::Fatal);
        assert_eq!(Level::parse("trace"), Level::Trace);
        assert_eq!(Level::parse("print"), Level::Print);
    }

    #[test]
    fn test_parse_unknown_defaults_to_debug() {
        assert_eq!(Level::parse(""), Level::Debug);
        assert_eq!(Level::parse("verbose"), Level::Debug);
        assert_eq!(Level::parse("42"), Level::Debug);
    }

    #[test]
    fn test_display_and_tag() {
        assert_eq!(Level::Warn.to_string(), "warn");
        assert_eq!(Level::Warn.tag(), "WRN");
        assert_eq!(Level::Print.tag(), "");
    }

    #[test]
    fn test_admits_threshold() {
        assert!(Level::Warn.admits(Level::Warn, false));
        assert!(Level::Error.admits(Level::Warn, false));
        assert!(!Level::Info.admits(Level::Warn, false));
        assert!(!Level::Print.admits(Level::Trace, false));
    }

    #[test]
    fn test_admits_force_debug_override() {
        assert!(Level::Debug.admits(Level::Error, true));
        // The override applies to Debug only.
        assert!(!Level::Trace.admits(Level::Error, true));
        assert!(!Level::Info.admits(Level::Error, true));
    }

    #[test]
    fn test_serde_lowercase_names() {
        let json = serde_json::to_string(&Level::Warn).expect("serialize");
        assert_eq!(json, "\"warn\"");
        let level: Level = serde_json::from_str("\"fatal\"").expect("deserialize");
        assert_eq!(level, Level::Fatal);
    }
}
