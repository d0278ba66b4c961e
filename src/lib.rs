//! # fanlog
//!
//! Structured logging facade that fans each event out to multiple sinks:
//! console, file, syslog, and a batched ClickHouse writer.
//!
//! ## Features
//!
//! - **Scoped sub-loggers**: derive children carrying a hierarchical name
//!   prefix and structured key/value params
//! - **Multi-sink fan-out**: every event reaches every registered sink
//! - **Batched persistence**: a bounded, non-blocking queue drained
//!   periodically as one transactional ClickHouse write
//! - **Thread safe**: emit from any thread; contexts are immutable and the
//!   sink set is fixed at construction

pub mod config;
pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::core::{
        Level, LogRecord, Logger, LoggerError, Params, Result, ScopeContext, Sink, SinkLogger,
        CONSOLE_SINK_NAME,
    };
    pub use crate::sinks::{
        BatchMetrics, ClickHouseConfig, ClickHouseSink, ConsoleConfig, ConsoleSink, FileConfig,
        FileSink,
    };
    #[cfg(unix)]
    pub use crate::sinks::{SyslogConfig, SyslogSink};
}

pub use config::Config;
pub use self::core::{
    Level, LogRecord, Logger, LoggerError, Params, Result, ScopeContext, Sink, SinkLogger,
    CONSOLE_SINK_NAME,
};
pub use sinks::{
    BatchMetrics, BatchStore, ClickHouseConfig, ClickHouseSink, ConsoleConfig, ConsoleSink,
    FileConfig, FileSink, MemoryStore,
};
#[cfg(unix)]
pub use sinks::{SyslogConfig, SyslogSink};
