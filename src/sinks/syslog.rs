//! Syslog sink over the POSIX syslog API. Unix-like platforms only.

use crate::core::{Level, Logger, LoggerError, Result, ScopeContext, Sink, SinkLogger};
use libc::c_int;
use serde::{Deserialize, Serialize};
use std::ffi::{CStr, CString};
use std::ptr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyslogConfig {
    pub facility: String,
    pub tag: String,
    pub min_level: Level,
    pub force_debug: bool,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            facility: "daemon".to_string(),
            tag: String::new(),
            min_level: Level::Print,
            force_debug: false,
        }
    }
}

/// Sink writing one `syslog(3)` call per admitted record.
///
/// The process has a single syslog connection; constructing more than one
/// `SyslogSink` at a time reconfigures that shared connection.
pub struct SyslogSink {
    cfg: SyslogConfig,
    /// `openlog` may retain the ident pointer, so the string must stay
    /// alive until `closelog`.
    _ident: Option<CString>,
    diag: OnceLock<SinkLogger>,
}

impl SyslogSink {
    pub fn new(cfg: SyslogConfig) -> Result<Self> {
        let ident = if cfg.tag.is_empty() {
            None
        } else {
            Some(CString::new(cfg.tag.as_str()).map_err(|_| {
                LoggerError::config("SyslogSink", "tag contains a NUL byte")
            })?)
        };
        let ident_ptr = ident.as_ref().map_or(ptr::null(), |tag| tag.as_ptr());
        let facility = facility_from_name(&cfg.facility);
        unsafe {
            libc::openlog(ident_ptr, libc::LOG_PID, facility);
        }
        Ok(Self {
            cfg,
            _ident: ident,
            diag: OnceLock::new(),
        })
    }
}

impl Sink for SyslogSink {
    fn accept(&self, level: Level, message: &str, context: &ScopeContext) {
        if !level.admits(self.cfg.min_level, self.cfg.force_debug) {
            return;
        }
        let line = context.render(level, message, false);
        let msg = match CString::new(line.replace('\0', "")) {
            Ok(msg) => msg,
            Err(err) => {
                if let Some(diag) = self.diag.get() {
                    diag.error(format!("syslog message encoding error: {}", err));
                }
                return;
            }
        };
        unsafe {
            libc::syslog(
                priority(level),
                CStr::from_bytes_with_nul_unchecked(b"%s\0").as_ptr(),
                msg.as_ptr(),
            );
        }
    }

    fn init(&self, root: &Logger) {
        let _ = self.diag.set(root.scope("syslog").std());
    }

    fn name(&self) -> &str {
        "syslog"
    }

    fn release(&self) -> Result<()> {
        unsafe {
            libc::closelog();
        }
        Ok(())
    }
}

fn priority(level: Level) -> c_int {
    match level {
        Level::Fatal => libc::LOG_CRIT,
        Level::Error => libc::LOG_ERR,
        Level::Warn => libc::LOG_WARNING,
        Level::Info => libc::LOG_INFO,
        Level::Debug | Level::Trace => libc::LOG_DEBUG,
        Level::Print => libc::LOG_NOTICE,
    }
}

fn facility_from_name(name: &str) -> c_int {
    match name {
        "kern" | "kernel" => libc::LOG_KERN,
        "user" => libc::LOG_USER,
        "mail" => libc::LOG_MAIL,
        "daemon" => libc::LOG_DAEMON,
        "auth" => libc::LOG_AUTH,
        "syslog" => libc::LOG_SYSLOG,
        "lpr" => libc::LOG_LPR,
        "news" => libc::LOG_NEWS,
        "uucp" => libc::LOG_UUCP,
        "cron" => libc::LOG_CRON,
        "authpriv" => libc::LOG_AUTHPRIV,
        "ftp" => libc::LOG_FTP,
        "local0" => libc::LOG_LOCAL0,
        "local1" => libc::LOG_LOCAL1,
        "local2" => libc::LOG_LOCAL2,
        "local3" => libc::LOG_LOCAL3,
        "local4" => libc::LOG_LOCAL4,
        "local5" => libc::LOG_LOCAL5,
        "local6" => libc::LOG_LOCAL6,
        "local7" => libc::LOG_LOCAL7,
        _ => libc::LOG_USER,
    }
}
