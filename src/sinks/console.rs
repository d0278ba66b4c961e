//! Console sink implementation

use crate::core::{Level, Result, ScopeContext, Sink, CONSOLE_SINK_NAME};
use chrono::Local;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    pub min_level: Level,
    pub force_debug: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            min_level: Level::Error,
            force_debug: false,
        }
    }
}

/// Synchronous console sink: one colorized line per record, written to
/// stdout, with `Error`/`Fatal` routed to stderr.
pub struct ConsoleSink {
    cfg: ConsoleConfig,
    out: Mutex<Box<dyn Write + Send>>,
    err: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn new(cfg: ConsoleConfig) -> Self {
        Self::with_writers(cfg, Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Construct with explicit output handles.
    pub fn with_writers(
        cfg: ConsoleConfig,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            cfg,
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(ConsoleConfig::default())
    }
}

impl Sink for ConsoleSink {
    fn accept(&self, level: Level, message: &str, context: &ScopeContext) {
        if !level.admits(self.cfg.min_level, self.cfg.force_debug) {
            return;
        }
        let line = context.render(level, message, true);
        let stamp = Local::now().format("%Y/%m/%d %H:%M:%S");
        let mut writer = match level {
            Level::Error | Level::Fatal => self.err.lock(),
            _ => self.out.lock(),
        };
        // accept never fails the caller
        let _ = writeln!(writer, "{} {}", stamp, line);
    }

    fn name(&self) -> &str {
        CONSOLE_SINK_NAME
    }

    fn flush(&self) {
        let _ = self.out.lock().flush();
        let _ = self.err.lock().flush();
    }

    fn release(&self) -> Result<()> {
        self.out.lock().flush()?;
        self.err.lock().flush()?;
        Ok(())
    }
}
