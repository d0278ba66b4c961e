//! Sink trait for log output destinations

use super::context::ScopeContext;
use super::error::Result;
use super::level::Level;
use super::logger::Logger;

/// Reserved registration name of the console sink. [`Logger::root`]
/// guarantees a sink under this name always exists.
pub const CONSOLE_SINK_NAME: &str = "std";

/// Capability contract shared by every sink variant.
///
/// Sinks are shared read-only across the whole dispatcher tree and across
/// threads, so every operation takes `&self`; interior state needs its own
/// synchronization.
pub trait Sink: Send + Sync {
    /// Accept one record. Side effect only: must never panic, and must never
    /// block the calling dispatcher beyond a bounded enqueue attempt.
    fn accept(&self, level: Level, message: &str, context: &ScopeContext);

    /// Called exactly once at registration, before any `accept`. The owner
    /// dispatcher can be used to build a named sub-logger for the sink's own
    /// diagnostics.
    fn init(&self, root: &Logger) {
        let _ = root;
    }

    /// Stable registration key; the dispatcher requires uniqueness.
    fn name(&self) -> &str;

    /// Force buffered state to be persisted now. No-op for stateless sinks.
    fn flush(&self) {}

    /// Close underlying resources. Errors are surfaced to the caller.
    fn release(&self) -> Result<()> {
        Ok(())
    }
}
