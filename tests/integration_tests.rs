//! End-to-end tests across the dispatcher tree and the batch sink.

use fanlog::prelude::*;
use fanlog::MemoryStore;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Console writer whose buffer outlives the sink.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("buffer lock")).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_console(min_level: Level) -> (Arc<ConsoleSink>, SharedBuf, SharedBuf) {
    let out = SharedBuf::default();
    let err = SharedBuf::default();
    let cfg = ConsoleConfig {
        min_level,
        force_debug: false,
    };
    let sink = Arc::new(ConsoleSink::with_writers(
        cfg,
        Box::new(out.clone()),
        Box::new(err.clone()),
    ));
    (sink, out, err)
}

fn batch_sink(capacity: usize, store: Arc<MemoryStore>) -> Arc<ClickHouseSink> {
    let cfg = ClickHouseConfig {
        service: "it".to_string(),
        buffer_capacity: capacity,
        batch_interval: Duration::from_secs(3600),
        ..ClickHouseConfig::default()
    };
    Arc::new(ClickHouseSink::with_store(cfg, store, "192.0.2.1").expect("construct batch sink"))
}

#[test]
fn batch_sink_caps_queue_and_commits_oldest() {
    // Capacity 3, interval far away: five accepts keep the three oldest.
    let store = Arc::new(MemoryStore::new());
    let sink = batch_sink(3, store.clone());
    let ctx = ScopeContext::root();

    for i in 1..=5 {
        sink.accept(Level::Info, &format!("m{}", i), &ctx);
    }
    assert_eq!(sink.queue_len(), 3);

    sink.flush();
    let messages: Vec<String> = store.rows().iter().map(|r| r.message.clone()).collect();
    assert_eq!(messages, vec!["m1", "m2", "m3"]);
    assert_eq!(sink.metrics().dropped(), 2);
}

#[test]
fn scoped_emit_renders_prefix_and_params_on_console() {
    let (console, out, _err) = capture_console(Level::Info);
    let logger = Logger::root(vec![console]).expect("root");

    let scoped = logger
        .scope("a")
        .scope("b")
        .with_params(Params::new().with("x", 1));
    scoped.info("payload arrived");

    let contents = out.contents();
    assert!(contents.contains("(a/b)"), "missing prefix in: {contents}");
    assert!(contents.contains(r#"{"x":1}"#), "missing params in: {contents}");
    assert!(contents.contains("payload arrived"));
}

#[test]
fn threshold_admits_only_configured_levels() {
    let (console, out, err) = capture_console(Level::Warn);
    let logger = Logger::root(vec![console]).expect("root");

    logger.debug("too quiet");
    logger.warn("loud enough");

    let all = format!("{}{}", out.contents(), err.contents());
    assert!(all.contains("loud enough"));
    assert!(!all.contains("too quiet"));
}

#[test]
fn fanout_reaches_console_and_batch_sink() {
    let store = Arc::new(MemoryStore::new());
    let sink = batch_sink(16, store.clone());
    let (console, out, _err) = capture_console(Level::Debug);

    let logger = Logger::root(vec![console, sink]).expect("root");
    let scoped = logger.scope("worker").with_params(Params::new().with("id", 3));
    scoped.info("task done");

    logger.flush_all();

    assert!(out.contents().contains("task done"));
    let rows = store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].prefix, "worker");
    assert_eq!(rows[0].service, "it");
    assert_eq!(rows[0].server, "192.0.2.1");

    // The batch sink reports its commit through the console sink.
    assert!(out.contents().contains("(clickhouse)"));
    assert!(out.contents().contains("inserted 1 logs"));

    logger.close_all().expect("close");
}

#[test]
fn concurrent_flushes_commit_each_record_exactly_once() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 50;

    let store = Arc::new(MemoryStore::new());
    let sink = batch_sink(PRODUCERS * PER_PRODUCER, store.clone());

    let mut handles = Vec::new();
    for producer in 0..PRODUCERS {
        let sink = Arc::clone(&sink);
        handles.push(thread::spawn(move || {
            let ctx = ScopeContext::root();
            for i in 0..PER_PRODUCER {
                sink.accept(Level::Info, &format!("p{}-{}", producer, i), &ctx);
                if i % 10 == 0 {
                    sink.flush();
                }
            }
        }));
    }
    for _ in 0..3 {
        let sink = Arc::clone(&sink);
        handles.push(thread::spawn(move || {
            for _ in 0..20 {
                sink.flush();
            }
        }));
    }
    for handle in handles {
        handle.join().expect("worker");
    }
    sink.flush();

    let mut messages: Vec<String> = store.rows().iter().map(|r| r.message.clone()).collect();
    assert_eq!(messages.len(), PRODUCERS * PER_PRODUCER);
    messages.sort();
    messages.dedup();
    assert_eq!(messages.len(), PRODUCERS * PER_PRODUCER, "duplicate commits");
    assert_eq!(sink.metrics().dropped(), 0);
}

#[test]
fn get_bypasses_fanout_to_one_sink() {
    let store = Arc::new(MemoryStore::new());
    let sink = batch_sink(16, store.clone());
    let (console, out, _err) = capture_console(Level::Debug);

    let logger = Logger::root(vec![console, sink]).expect("root");
    let direct = logger.scope("direct").get("clickhouse").expect("clickhouse sink");
    direct.warn("batch only");
    logger.flush_all();

    assert_eq!(store.rows().len(), 1);
    assert_eq!(store.rows()[0].prefix, "direct");
    assert!(!out.contents().contains("batch only"));
}

#[test]
fn print_level_renders_without_tag_and_skips_batch() {
    let store = Arc::new(MemoryStore::new());
    let sink = batch_sink(16, store.clone());
    let (console, out, _err) = capture_console(Level::Print);

    let logger = Logger::root(vec![console, sink]).expect("root");
    logger.print("banner text");
    logger.flush_all();

    let contents = out.contents();
    assert!(contents.contains("banner text"));
    assert!(!contents.contains('['), "unexpected level tag in: {contents}");
    assert!(store.rows().is_empty());
}
