//! Dispatcher tree: scoped loggers fanning out to a shared set of sinks

use super::context::{Params, ScopeContext};
use super::error::{LoggerError, Result};
use super::level::Level;
use super::sink::{Sink, CONSOLE_SINK_NAME};
use crate::sinks::console::ConsoleSink;
use std::collections::HashMap;
use std::sync::Arc;

type SinkMap = HashMap<String, Arc<dyn Sink>>;

/// A node in the dispatcher tree.
///
/// Every node shares one sink map, built at root construction and never
/// mutated afterwards, so fan-out needs no locking. The node's own context
/// (prefix + params) is immutable; deriving a child copies it. Cloning a
/// `Logger` is two `Arc` bumps.
#[derive(Clone)]
pub struct Logger {
    context: Arc<ScopeContext>,
    sinks: Arc<SinkMap>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("context", &self.context)
            .field("sinks", &self.sinks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Logger {
    /// Build the root dispatcher from the given sinks.
    ///
    /// Registers every sink under its [`Sink::name`], synthesizes a default
    /// console sink when none was supplied under the reserved `"std"` name,
    /// and initializes each sink exactly once. Duplicate names are a
    /// construction error.
    pub fn root(sinks: Vec<Arc<dyn Sink>>) -> Result<Logger> {
        let mut map = SinkMap::new();
        for sink in sinks {
            let name = sink.name().to_string();
            if map.insert(name.clone(), sink).is_some() {
                return Err(LoggerError::DuplicateSink(name));
            }
        }
        if !map.contains_key(CONSOLE_SINK_NAME) {
            map.insert(
                CONSOLE_SINK_NAME.to_string(),
                Arc::new(ConsoleSink::default()),
            );
        }

        let logger = Logger {
            context: Arc::new(ScopeContext::root()),
            sinks: Arc::new(map),
        };
        for sink in logger.sinks.values() {
            sink.init(&logger);
        }
        Ok(logger)
    }

    pub fn context(&self) -> &ScopeContext {
        &self.context
    }

    /// Derive a sub-logger whose prefix is extended by `name`.
    ///
    /// The child shares the sink map; no sink is touched or re-initialized.
    #[must_use]
    pub fn scope(&self, name: &str) -> Logger {
        Logger {
            context: Arc::new(self.context.child(name)),
            sinks: Arc::clone(&self.sinks),
        }
    }

    /// Derive a sub-logger with `params` overlaid onto the inherited set.
    /// New keys win on collision; inherited keys are copied, not shared.
    #[must_use]
    pub fn with_params(&self, params: Params) -> Logger {
        Logger {
            context: Arc::new(self.context.with_params(&params)),
            sinks: Arc::clone(&self.sinks),
        }
    }

    /// Fan the raw (level, message, context) triple out to every sink, in
    /// unspecified order.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        let message = message.into();
        for sink in self.sinks.values() {
            sink.accept(level, &message, &self.context);
        }
    }

    /// Level-less output (no severity tag).
    #[inline]
    pub fn print(&self, message: impl Into<String>) {
        self.log(Level::Print, message);
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(Level::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(Level::Fatal, message);
    }

    /// Flush every sink, sequentially. Out-of-band persistence independent
    /// of the batch sink's timer (e.g. before a graceful shutdown).
    pub fn flush_all(&self) {
        for sink in self.sinks.values() {
            sink.flush();
        }
    }

    /// Release every sink. Returns the first error encountered; later sinks
    /// are not guaranteed to have been released after a failure. Callers
    /// needing full cleanup despite partial failure release per sink via
    /// [`Logger::get`].
    pub fn close_all(&self) -> Result<()> {
        for sink in self.sinks.values() {
            sink.release()?;
        }
        Ok(())
    }

    /// A view bound to the single named sink, sharing this node's context.
    /// Bypasses fan-out to target one sink explicitly.
    pub fn get(&self, name: &str) -> Option<SinkLogger> {
        self.sinks.get(name).map(|sink| SinkLogger {
            sink: Arc::clone(sink),
            context: Arc::clone(&self.context),
        })
    }

    /// The console-sink view. Root construction guarantees the sink exists.
    pub fn std(&self) -> SinkLogger {
        self.get(CONSOLE_SINK_NAME).unwrap_or_else(|| SinkLogger {
            sink: Arc::new(ConsoleSink::default()),
            context: Arc::clone(&self.context),
        })
    }
}

/// A logger bound to one sink, sharing its parent's context.
#[derive(Clone)]
pub struct SinkLogger {
    sink: Arc<dyn Sink>,
    context: Arc<ScopeContext>,
}

impl SinkLogger {
    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.sink.accept(level, &message.into(), &self.context);
    }

    #[inline]
    pub fn print(&self, message: impl Into<String>) {
        self.log(Level::Print, message);
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(Level::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(Level::Fatal, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Sink that records every accepted (level, rendered line) pair.
    struct RecordingSink {
        name: String,
        lines: Mutex<Vec<(Level, String)>>,
        inited: Mutex<u32>,
        released: Mutex<u32>,
    }

    impl RecordingSink {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                lines: Mutex::new(Vec::new()),
                inited: Mutex::new(0),
                released: Mutex::new(0),
            })
        }
    }

    impl Sink for RecordingSink {
        fn accept(&self, level: Level, message: &str, context: &ScopeContext) {
            self.lines
                .lock()
                .push((level, context.render(level, message, false)));
        }

        fn init(&self, _root: &Logger) {
            *self.inited.lock() += 1;
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn release(&self) -> Result<()> {
            *self.released.lock() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_root_synthesizes_console_sink() {
        let logger = Logger::root(vec![]).expect("root");
        assert!(logger.get(CONSOLE_SINK_NAME).is_some());
    }

    #[test]
    fn test_root_initializes_each_sink_once() {
        let sink = RecordingSink::new("rec");
        let _logger = Logger::root(vec![sink.clone()]).expect("root");
        assert_eq!(*sink.inited.lock(), 1);
    }

    #[test]
    fn test_root_rejects_duplicate_names() {
        let a = RecordingSink::new("rec");
        let b = RecordingSink::new("rec");
        let err = Logger::root(vec![a, b]).expect_err("duplicate");
        assert!(matches!(err, LoggerError::DuplicateSink(name) if name == "rec"));
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = RecordingSink::new("a");
        let b = RecordingSink::new("b");
        let logger = Logger::root(vec![a.clone(), b.clone()]).expect("root");

        logger.info("hello");

        assert_eq!(a.lines.lock().len(), 1);
        assert_eq!(b.lines.lock().len(), 1);
    }

    #[test]
    fn test_scope_extends_prefix_without_touching_parent() {
        let sink = RecordingSink::new("rec");
        let root = Logger::root(vec![sink.clone()]).expect("root");
        let child = root.scope("a").scope("b");

        child.warn("deep");
        root.warn("shallow");

        let lines = sink.lines.lock();
        assert!(lines[0].1.contains("(a/b)"));
        assert!(!lines[1].1.contains("(a/b)"));
    }

    #[test]
    fn test_with_params_overlay() {
        let sink = RecordingSink::new("rec");
        let root = Logger::root(vec![sink.clone()]).expect("root");
        let child = root
            .with_params(Params::new().with("k", "v"))
            .with_params(Params::new().with("k", "w"));

        child.info("msg");

        let lines = sink.lines.lock();
        assert!(lines[0].1.contains(r#"{"k":"w"}"#));
    }

    #[test]
    fn test_get_targets_single_sink() {
        let a = RecordingSink::new("a");
        let b = RecordingSink::new("b");
        let logger = Logger::root(vec![a.clone(), b.clone()]).expect("root");

        let only_a = logger.scope("mod").get("a").expect("sink a");
        only_a.error("targeted");

        assert_eq!(a.lines.lock().len(), 1);
        assert!(a.lines.lock()[0].1.contains("(mod)"));
        assert!(b.lines.lock().is_empty());

        assert!(logger.get("missing").is_none());
    }

    #[test]
    fn test_close_all_releases_sinks() {
        let sink = RecordingSink::new("rec");
        let logger = Logger::root(vec![sink.clone()]).expect("root");
        logger.close_all().expect("close");
        assert_eq!(*sink.released.lock(), 1);
    }
}
