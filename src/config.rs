//! Sink wiring configuration
//!
//! Enumerates which sinks are enabled and their settings. How the structure
//! is loaded (file format, environment) is up to the caller; everything here
//! is plain serde.

use crate::core::{Logger, Result, Sink};
use crate::sinks::{ClickHouseConfig, ClickHouseSink, ConsoleConfig, ConsoleSink, FileConfig, FileSink};
#[cfg(unix)]
use crate::sinks::{SyslogConfig, SyslogSink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// The console sink is always wired; this only tunes it.
    pub console: ConsoleConfig,
    #[cfg(unix)]
    pub syslog: Option<SyslogConfig>,
    pub file: Option<FileConfig>,
    pub clickhouse: Option<ClickHouseConfig>,
}

impl Config {
    /// Wire the enabled sinks into a root dispatcher.
    pub fn build(&self) -> Result<Logger> {
        let mut sinks: Vec<Arc<dyn Sink>> =
            vec![Arc::new(ConsoleSink::new(self.console.clone()))];
        #[cfg(unix)]
        if let Some(cfg) = &self.syslog {
            sinks.push(Arc::new(SyslogSink::new(cfg.clone())?));
        }
        if let Some(cfg) = &self.file {
            sinks.push(Arc::new(FileSink::new(cfg.clone())?));
        }
        if let Some(cfg) = &self.clickhouse {
            sinks.push(Arc::new(ClickHouseSink::new(cfg.clone())?));
        }
        Logger::root(sinks)
    }
}
