//! File sink implementation

use crate::core::{Level, Logger, Result, ScopeContext, Sink, SinkLogger};
use chrono::Local;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileConfig {
    pub path: PathBuf,
    pub min_level: Level,
    pub force_debug: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        // <argv0>.log in the working directory
        let stem = std::env::args()
            .next()
            .as_deref()
            .map(Path::new)
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string());
        Self {
            path: PathBuf::from(format!("{}.log", stem)),
            min_level: Level::Print,
            force_debug: false,
        }
    }
}

/// Append-only file sink: one uncolored line per record.
pub struct FileSink {
    cfg: FileConfig,
    writer: Mutex<Option<BufWriter<std::fs::File>>>,
    diag: OnceLock<SinkLogger>,
}

impl FileSink {
    pub fn new(cfg: FileConfig) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cfg.path)?;
        Ok(Self {
            cfg,
            writer: Mutex::new(Some(BufWriter::new(file))),
            diag: OnceLock::new(),
        })
    }
}

impl Sink for FileSink {
    fn accept(&self, level: Level, message: &str, context: &ScopeContext) {
        if !level.admits(self.cfg.min_level, self.cfg.force_debug) {
            return;
        }
        let line = context.render(level, message, false);
        let stamp = Local::now().format("%Y/%m/%d %H:%M:%S");
        let result = match self.writer.lock().as_mut() {
            Some(writer) => writeln!(writer, "{} {}", stamp, line),
            None => return, // released
        };
        if let (Err(err), Some(diag)) = (result, self.diag.get()) {
            diag.error(format!("file write error: {}", err));
        }
    }

    fn init(&self, root: &Logger) {
        let _ = self.diag.set(root.scope("file").std());
    }

    fn name(&self) -> &str {
        "file"
    }

    fn flush(&self) {
        if let Some(writer) = self.writer.lock().as_mut() {
            if let (Err(err), Some(diag)) = (writer.flush(), self.diag.get()) {
                diag.error(format!("file flush error: {}", err));
            }
        }
    }

    fn release(&self) -> Result<()> {
        if let Some(mut writer) = self.writer.lock().take() {
            writer.flush()?;
        }
        Ok(())
    }
}
