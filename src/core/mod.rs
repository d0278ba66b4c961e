//! Core logger types and traits

pub mod context;
pub mod error;
pub mod level;
pub mod logger;
pub mod record;
pub mod sink;

pub use context::{Params, ScopeContext};
pub use error::{LoggerError, Result};
pub use level::Level;
pub use logger::{Logger, SinkLogger};
pub use record::LogRecord;
pub use sink::{Sink, CONSOLE_SINK_NAME};
