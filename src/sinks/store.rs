//! Remote batch store behind the ClickHouse sink
//!
//! The store is a trait seam so the transactional drain is testable without
//! a server. A batch is opened with [`BatchStore::begin`], filled record by
//! record, and persisted atomically on [`BatchInsert::commit`]; dropping an
//! uncommitted batch persists nothing.

use super::clickhouse::ClickHouseConfig;
use crate::core::{LogRecord, LoggerError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub trait BatchStore: Send + Sync {
    /// Idempotent create-if-absent of the target schema.
    fn ensure_schema(&self) -> Result<()>;

    /// Open a new batch.
    fn begin(&self) -> Result<Box<dyn BatchInsert + '_>>;

    /// Close the underlying connection.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

pub trait BatchInsert {
    /// Stage one record into the batch. A failure affects this record only.
    fn insert(&mut self, record: &LogRecord) -> Result<()>;

    /// Atomically persist every staged record; failure persists nothing.
    fn commit(self: Box<Self>) -> Result<()>;
}

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS logs (
    service String,
    server  String,
    level   Enum8('trace' = 0, 'debug' = 1, 'info' = 2, 'warn' = 3, 'error' = 4, 'fatal' = 5),
    prefix  String,
    params  String,
    message String,
    tm      DateTime
) ENGINE = MergeTree()
ORDER BY tm
PARTITION BY toYYYYMMDD(tm)";

const INSERT_QUERY: &str =
    "INSERT INTO logs (service, server, level, prefix, params, message, tm) FORMAT JSONEachRow";

/// Store speaking the ClickHouse HTTP interface.
///
/// A batch is staged locally as JSONEachRow lines and shipped in a single
/// `INSERT` request at commit, so a failed commit leaves nothing behind on
/// the server.
pub struct ClickHouseStore {
    client: reqwest::blocking::Client,
    address: String,
    database: String,
    username: String,
    password: String,
}

impl ClickHouseStore {
    pub fn connect(cfg: &ClickHouseConfig) -> Result<Self> {
        if cfg.address.is_empty() {
            return Err(LoggerError::config("ClickHouseStore", "empty address"));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(cfg.timeout)
            .build()?;
        Ok(Self {
            client,
            address: cfg.address.clone(),
            database: cfg.database.clone(),
            username: cfg.username.clone(),
            password: cfg.password.clone(),
        })
    }

    fn execute(&self, operation: &str, query: &str, body: String) -> Result<()> {
        let mut request = self
            .client
            .post(&self.address)
            .query(&[("database", self.database.as_str()), ("query", query)])
            .body(body);
        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(LoggerError::store(
                operation.to_string(),
                format!("{}: {}", status, detail.trim()),
            ));
        }
        Ok(())
    }
}

impl BatchStore for ClickHouseStore {
    fn ensure_schema(&self) -> Result<()> {
        self.execute("creating schema", SCHEMA, String::new())
    }

    fn begin(&self) -> Result<Box<dyn BatchInsert + '_>> {
        Ok(Box::new(HttpBatch {
            store: self,
            rows: String::new(),
        }))
    }
}

struct HttpBatch<'a> {
    store: &'a ClickHouseStore,
    rows: String,
}

pub(crate) fn encode_row(record: &LogRecord) -> Result<String> {
    let row = serde_json::json!({
        "service": record.service,
        "server": record.server,
        "level": record.level.as_str(),
        "prefix": record.prefix,
        "params": record.params.to_json(),
        "message": record.message,
        "tm": record.timestamp.timestamp(),
    });
    Ok(serde_json::to_string(&row)?)
}

impl BatchInsert for HttpBatch<'_> {
    fn insert(&mut self, record: &LogRecord) -> Result<()> {
        let line = encode_row(record)?;
        self.rows.push_str(&line);
        self.rows.push('\n');
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }
        self.store
            .execute("committing batch", INSERT_QUERY, self.rows)
    }
}

/// In-process transactional store, for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<LogRecord>>,
    commits: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every committed row, in commit order.
    pub fn rows(&self) -> Vec<LogRecord> {
        self.rows.lock().clone()
    }

    /// Number of committed (non-trivial) batches.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::Relaxed)
    }
}

impl BatchStore for MemoryStore {
    fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    fn begin(&self) -> Result<Box<dyn BatchInsert + '_>> {
        Ok(Box::new(MemoryBatch {
            store: self,
            staged: Vec::new(),
        }))
    }
}

struct MemoryBatch<'a> {
    store: &'a MemoryStore,
    staged: Vec<LogRecord>,
}

impl BatchInsert for MemoryBatch<'_> {
    fn insert(&mut self, record: &LogRecord) -> Result<()> {
        self.staged.push(record.clone());
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        self.store.rows.lock().extend(self.staged);
        self.store.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
