//! Capturing logger
//!
//! [`CaptureLogger`] is the process-wide `log::Log` implementation. It wraps
//! an `env_logger` logger: records are always forwarded to `env_logger`
//! subject to its own filter, and while a capture window is open every
//! record (regardless of level) is also appended to the window.

use std::sync::OnceLock;

use chrono::Utc;
use log::{Log, Metadata, Record};

use super::{LogEntry, active_sink};

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// `log::Log` implementation feeding capture windows
pub struct CaptureLogger {
    inner: env_logger::Logger,
}

impl CaptureLogger {
    /// Wrap an `env_logger` logger
    #[must_use]
    pub fn new(inner: env_logger::Logger) -> Self {
        Self { inner }
    }
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        active_sink().is_some() || self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if let Some(sink) = active_sink() {
            sink.append_entry(LogEntry {
                level: record.level(),
                target: record.target().to_string(),
                message: record.args().to_string(),
                timestamp: Utc::now(),
            });
        }

        if self.inner.matches(record) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the capturing logger around the logger `builder` produces
///
/// Only the first call in a process has any effect. Returns whether the
/// capturing logger is the installed global logger; `false` means some other
/// logger was registered first, in which case capture windows still collect
/// console output but no log records.
pub fn install(mut builder: env_logger::Builder) -> bool {
    *INSTALLED.get_or_init(|| {
        let inner = builder.build();
        let filter = inner.filter();
        match log::set_boxed_logger(Box::new(CaptureLogger::new(inner))) {
            Ok(()) => {
                log::set_max_level(filter);
                true
            }
            Err(_) => false,
        }
    })
}

/// Install with `RUST_LOG` (falling back to [`DEFAULT_FILTER`])
pub fn init() -> bool {
    install(default_builder())
}

/// Builder used when nothing else configured logging first
fn default_builder() -> env_logger::Builder {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_FILTER))
}

/// Make sure some logger decision has been made before a window opens
pub(crate) fn ensure_installed() {
    if INSTALLED.get().is_none() {
        init();
    }
}
