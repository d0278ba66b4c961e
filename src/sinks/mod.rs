//! Sink implementations

pub mod clickhouse;
pub mod console;
pub mod file;
pub mod store;
#[cfg(unix)]
pub mod syslog;

pub use clickhouse::{BatchMetrics, ClickHouseConfig, ClickHouseSink};
pub use console::{ConsoleConfig, ConsoleSink};
pub use file::{FileConfig, FileSink};
pub use store::{BatchInsert, BatchStore, ClickHouseStore, MemoryStore};
#[cfg(unix)]
pub use syslog::{SyslogConfig, SyslogSink};
