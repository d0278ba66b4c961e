//! ClickHouse batch persistence sink
//!
//! Records are accepted from arbitrary threads into a bounded queue and
//! drained periodically (or on explicit flush) as one transactional batch
//! write. The queue never blocks a caller: when full, the newest record is
//! discarded. Failures inside the sink are reported through its own
//! diagnostic logger, routed directly to the console sink.

use super::store::{BatchStore, ClickHouseStore};
use crate::core::{
    Level, LogRecord, Logger, LoggerError, Result, ScopeContext, Sink, SinkLogger,
};
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, UdpSocket};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClickHouseConfig {
    pub address: String,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Logical service name stamped on every record.
    pub service: String,
    /// Deadline for each flush cycle's network write.
    pub timeout: Duration,
    /// Interval of the background flush task.
    pub batch_interval: Duration,
    /// Capacity of the in-memory queue.
    pub buffer_capacity: usize,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:8123".to_string(),
            database: "default".to_string(),
            username: String::new(),
            password: String::new(),
            service: String::new(),
            timeout: Duration::from_secs(10),
            batch_interval: Duration::from_secs(30),
            buffer_capacity: 10_000,
        }
    }
}

/// Counters for the batch pipeline. Overflow drops are silent by design;
/// these are the only visibility into them.
#[derive(Debug, Default)]
pub struct BatchMetrics {
    dropped: AtomicU64,
    committed: AtomicU64,
}

impl BatchMetrics {
    /// Records discarded because the queue was at capacity.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Records successfully committed to the store.
    #[inline]
    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::Relaxed)
    }

    #[inline]
    fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_committed(&self, count: u64) {
        self.committed.fetch_add(count, Ordering::Relaxed);
    }
}

struct Inner {
    cfg: ClickHouseConfig,
    server: String,
    store: Arc<dyn BatchStore>,
    queue_tx: Sender<LogRecord>,
    queue_rx: Receiver<LogRecord>,
    /// Serializes flush cycles; `accept` never takes it.
    flush_gate: Mutex<()>,
    diag: OnceLock<SinkLogger>,
    metrics: BatchMetrics,
}

impl Inner {
    /// The single flush path, shared by the background task and explicit
    /// callers. Only one cycle runs at a time; a second caller waits on the
    /// gate and then finds the queue empty.
    fn flush_batch(&self) {
        let _gate = self.flush_gate.lock();
        if self.queue_rx.is_empty() {
            return;
        }
        let mut batch = match self.store.begin() {
            Ok(batch) => batch,
            Err(err) => {
                // Queue untouched; records wait for the next cycle.
                self.diag_error(format!("begin batch error: {}", err));
                return;
            }
        };
        let mut count: u64 = 0;
        while let Ok(record) = self.queue_rx.try_recv() {
            match batch.insert(&record) {
                Ok(()) => count += 1,
                Err(err) => self.diag_error(format!("insert error: {}", err)),
            }
        }
        match batch.commit() {
            Ok(()) => {
                self.metrics.record_committed(count);
                if let Some(diag) = self.diag.get() {
                    diag.debug(format!("inserted {} logs", count));
                }
            }
            Err(err) => self.diag_error(format!("commit error: {}", err)),
        }
    }

    fn diag_error(&self, message: String) {
        if let Some(diag) = self.diag.get() {
            diag.error(message);
        }
    }
}

/// The batch persistence sink.
pub struct ClickHouseSink {
    inner: Arc<Inner>,
    stop: Sender<()>,
    flusher: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ClickHouseSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseSink").finish_non_exhaustive()
    }
}

impl ClickHouseSink {
    /// Connect to ClickHouse, ensure the schema, resolve the host identity,
    /// and start the background flush task. Any failure here is fatal: the
    /// sink is never returned half-initialized.
    pub fn new(cfg: ClickHouseConfig) -> Result<Self> {
        let store = Arc::new(ClickHouseStore::connect(&cfg)?);
        let server = resolve_host_ipv4()?;
        Self::with_store(cfg, store, server)
    }

    /// Construct over an arbitrary store with an explicit host identity.
    /// Used by tests and alternative backends.
    pub fn with_store(
        cfg: ClickHouseConfig,
        store: Arc<dyn BatchStore>,
        server: impl Into<String>,
    ) -> Result<Self> {
        if cfg.buffer_capacity == 0 {
            return Err(LoggerError::config(
                "ClickHouseSink",
                "bufferCapacity must be at least 1",
            ));
        }
        store.ensure_schema()?;

        let (queue_tx, queue_rx) = bounded(cfg.buffer_capacity);
        let interval = cfg.batch_interval;
        let inner = Arc::new(Inner {
            cfg,
            server: server.into(),
            store,
            queue_tx,
            queue_rx,
            flush_gate: Mutex::new(()),
            diag: OnceLock::new(),
            metrics: BatchMetrics::default(),
        });

        let (stop_tx, stop_rx) = bounded(1);
        let flusher_inner = Arc::clone(&inner);
        let flusher = thread::Builder::new()
            .name("clickhouse-flush".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => flusher_inner.flush_batch(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            inner,
            stop: stop_tx,
            flusher: Mutex::new(Some(flusher)),
        })
    }

    pub fn metrics(&self) -> &BatchMetrics {
        &self.inner.metrics
    }

    /// Current queue occupancy.
    pub fn queue_len(&self) -> usize {
        self.inner.queue_rx.len()
    }
}

impl Sink for ClickHouseSink {
    fn accept(&self, level: Level, message: &str, context: &ScopeContext) {
        if level == Level::Print {
            // The remote schema stores the six severities only.
            return;
        }
        let record = LogRecord {
            service: self.inner.cfg.service.clone(),
            server: self.inner.server.clone(),
            level,
            prefix: context.prefix().to_string(),
            params: context.params().clone(),
            message: message.to_string(),
            timestamp: Utc::now(),
        };
        match self.inner.queue_tx.try_send(record) {
            Ok(()) => {}
            // Queue at capacity: the newest record is the one discarded.
            Err(TrySendError::Full(_)) => self.inner.metrics.record_dropped(),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    fn init(&self, root: &Logger) {
        let _ = self.inner.diag.set(root.scope("clickhouse").std());
    }

    fn name(&self) -> &str {
        "clickhouse"
    }

    fn flush(&self) {
        self.inner.flush_batch();
    }

    /// Stops the background task and closes the store. Pending records are
    /// not flushed: unpersisted state at close time is accepted loss. Call
    /// [`Logger::flush_all`] first when a final drain is wanted.
    fn release(&self) -> Result<()> {
        let _ = self.stop.try_send(());
        if let Some(handle) = self.flusher.lock().take() {
            handle
                .join()
                .map_err(|_| LoggerError::other("flush thread panicked"))?;
        }
        self.inner.store.close()
    }
}

/// First non-loopback IPv4 address of this host.
///
/// Connecting a UDP socket sends no datagram; it only asks the kernel which
/// local address the default route would use.
fn resolve_host_ipv4() -> Result<String> {
    let socket = UdpSocket::bind(("0.0.0.0", 0))?;
    socket
        .connect(("8.8.8.8", 53))
        .map_err(|err| LoggerError::HostResolution(err.to_string()))?;
    let addr = socket.local_addr()?;
    match addr.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Ok(ip.to_string()),
        other => Err(LoggerError::HostResolution(format!(
            "no non-loopback IPv4 address (resolved {})",
            other
        ))),
    }
}
