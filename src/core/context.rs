//! Scoped logging context: hierarchical name prefix plus structured params
//!
//! A [`ScopeContext`] is created once per dispatcher node and never mutated
//! afterwards; deriving a child copies the parent's state. This makes sharing
//! one node across threads safe without locking.

use super::level::Level;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured key/value parameters attached to a logging scope.
///
/// Keys map to any JSON-serializable value; ordering is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(serde_json::Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Compact JSON rendering; empty string when there are no params.
    pub fn to_json(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        Value::Object(self.0.clone()).to_string()
    }

    /// Copy of `self` with `extra` laid over it; `extra` wins on collision.
    #[must_use]
    pub fn overlay(&self, extra: &Params) -> Params {
        let mut merged = self.0.clone();
        for (key, value) in &extra.0 {
            merged.insert(key.clone(), value.clone());
        }
        Params(merged)
    }
}

impl From<serde_json::Map<String, Value>> for Params {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Params(map)
    }
}

/// Immutable snapshot of a dispatcher node's prefix and params.
#[derive(Debug, Clone, Default)]
pub struct ScopeContext {
    prefix: String,
    params: Params,
}

impl ScopeContext {
    /// The root context: empty prefix, no params.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Derive a child context with the prefix extended by `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> ScopeContext {
        let prefix = if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        };
        ScopeContext {
            prefix,
            params: self.params.clone(),
        }
    }

    /// Derive a child context with `extra` params overlaid; new keys win.
    #[must_use]
    pub fn with_params(&self, extra: &Params) -> ScopeContext {
        ScopeContext {
            prefix: self.prefix.clone(),
            params: self.params.overlay(extra),
        }
    }

    /// Render one display line: `[<TAG>](<prefix>)<json-params>: <message>`.
    ///
    /// The level tag is omitted for [`Level::Print`]. With `colorize`, the
    /// tag, prefix, and params segments are wrapped in ANSI colors, each
    /// segment colored as a whole so the plain text stays grep-able.
    pub fn render(&self, level: Level, message: &str, colorize: bool) -> String {
        let mut line = String::new();
        if level != Level::Print {
            if colorize {
                line.push_str(&format!("[{}]", level.colorized_tag()));
            } else {
                line.push_str(&format!("[{}]", level.tag()));
            }
        }
        if !self.prefix.is_empty() {
            let segment = format!("({})", self.prefix);
            if colorize {
                line.push_str(&segment.dimmed().to_string());
            } else {
                line.push_str(&segment);
            }
        }
        if !self.params.is_empty() {
            let json = self.params.to_json();
            if colorize {
                line.push_str(&json.cyan().to_string());
            } else {
                line.push_str(&json);
            }
        }
        if line.is_empty() {
            return message.to_string();
        }
        line.push_str(": ");
        line.push_str(message);
        line
    }
}
