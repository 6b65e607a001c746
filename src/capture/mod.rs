//! Scoped capture of console and log output
//!
//! A capture window intercepts everything written through the
//! [`console`] writers and every record that reaches the [`log`] facade
//! while a future runs, and hands the result back as a
//! [`CapturedTelemetry`] value owned by the caller.
//!
//! The interception is process-wide: anything written from any task while
//! the window is open lands in that window. Callers are expected to keep
//! windows from overlapping (the session controller does this with its
//! lifecycle and dispatch locks).
//!
//! # Module Structure
//!
//! - `console` - Console writers that route into the active window
//! - `logger` - `log::Log` implementation wrapping `env_logger`

pub mod console;
pub mod logger;

use std::future::Future;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use log::LevelFilter;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Sink of the currently open window, if any
static ACTIVE: LazyLock<Mutex<Option<Arc<WindowSink>>>> = LazyLock::new(|| Mutex::new(None));

// ============================================================================
// TELEMETRY TYPES
// ============================================================================

/// One log record captured inside a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Record level
    pub level: log::Level,
    /// Record target (usually the emitting module path)
    pub target: String,
    /// Fully rendered message text
    pub message: String,
    /// When the record was emitted
    pub timestamp: DateTime<Utc>,
}

/// Everything a single operation emitted while its window was open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedTelemetry {
    /// Bytes written to stdout and stderr, concatenated in write order
    pub console_text: String,
    /// Log records in emission order
    pub log_entries: Vec<LogEntry>,
}

impl CapturedTelemetry {
    /// True when nothing at all was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.console_text.is_empty() && self.log_entries.is_empty()
    }
}

/// Options for a capture window
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureOptions {
    /// Also write captured console bytes to the real stdout/stderr
    pub echo_console: bool,
}

// ============================================================================
// WINDOW
// ============================================================================

#[derive(Default)]
struct Buffers {
    console: Vec<u8>,
    entries: Vec<LogEntry>,
}

/// Private per-window buffers shared with the console writers and logger
pub(crate) struct WindowSink {
    buffers: Mutex<Buffers>,
    echo_console: bool,
}

impl WindowSink {
    pub(crate) fn append_console(&self, bytes: &[u8]) {
        self.buffers.lock().console.extend_from_slice(bytes);
    }

    pub(crate) fn append_entry(&self, entry: LogEntry) {
        self.buffers.lock().entries.push(entry);
    }

    pub(crate) fn echo_console(&self) -> bool {
        self.echo_console
    }

    fn take(&self) -> CapturedTelemetry {
        let buffers = std::mem::take(&mut *self.buffers.lock());
        CapturedTelemetry {
            console_text: String::from_utf8_lossy(&buffers.console).into_owned(),
            log_entries: buffers.entries,
        }
    }
}

/// Sink of the open window, cloned out so the global lock is not held
/// while writing.
pub(crate) fn active_sink() -> Option<Arc<WindowSink>> {
    ACTIVE.lock().clone()
}

/// Whether a capture window is currently open
#[must_use]
pub fn is_active() -> bool {
    ACTIVE.lock().is_some()
}

/// An open capture window
///
/// Opening installs the window's sink as the process-wide target for the
/// console writers and the capturing logger, and raises the log max level so
/// every record is observed. Dropping the window (normally, on panic, or when
/// the owning future is cancelled) restores whatever was active before and
/// the previous max level.
pub struct CaptureWindow {
    sink: Arc<WindowSink>,
    previous: Option<Arc<WindowSink>>,
    previous_level: LevelFilter,
}

impl CaptureWindow {
    /// Open a new window
    #[must_use]
    pub fn open(options: CaptureOptions) -> Self {
        logger::ensure_installed();

        let sink = Arc::new(WindowSink {
            buffers: Mutex::new(Buffers::default()),
            echo_console: options.echo_console,
        });

        let previous = ACTIVE.lock().replace(Arc::clone(&sink));
        let previous_level = log::max_level();
        log::set_max_level(LevelFilter::Trace);

        Self {
            sink,
            previous,
            previous_level,
        }
    }

    /// Close the window and return what it captured
    #[must_use]
    pub fn finish(self) -> CapturedTelemetry {
        self.sink.take()
    }
}

impl Drop for CaptureWindow {
    fn drop(&mut self) {
        *ACTIVE.lock() = self.previous.take();
        log::set_max_level(self.previous_level);
    }
}

/// Run `future` inside a capture window
///
/// Returns the future's output untouched together with the telemetry the
/// window collected. A failing output still comes back with everything that
/// was emitted before the failure.
pub async fn with_capture<F>(options: CaptureOptions, future: F) -> (F::Output, CapturedTelemetry)
where
    F: Future,
{
    let window = CaptureWindow::open(options);
    let output = future.await;
    (output, window.finish())
}
