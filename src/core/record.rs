//! Log record structure for the batch sink

use super::context::Params;
use super::level::Level;
use chrono::{DateTime, Utc};

/// One buffered row, built at enqueue time and consumed by a flush cycle.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub service: String,
    pub server: String,
    pub level: Level,
    pub prefix: String,
    pub params: Params,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
