//! Console writers
//!
//! [`stdout()`] and [`stderr()`] are the process's console channels as seen
//! by agents. Outside a capture window they write straight to the real
//! standard streams; inside one, the bytes go to the window buffer (and to
//! the real stream as well when the window echoes).

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use super::active_sink;

/// Which console channel a writer targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleStream {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// `io::Write` handle for one console channel
#[derive(Debug, Clone, Copy)]
pub struct ConsoleWriter {
    stream: ConsoleStream,
}

/// Writer for the stdout channel
#[must_use]
pub fn stdout() -> ConsoleWriter {
    ConsoleWriter {
        stream: ConsoleStream::Stdout,
    }
}

/// Writer for the stderr channel
#[must_use]
pub fn stderr() -> ConsoleWriter {
    ConsoleWriter {
        stream: ConsoleStream::Stderr,
    }
}

/// Writer for the given channel
#[must_use]
pub fn writer(stream: ConsoleStream) -> ConsoleWriter {
    ConsoleWriter { stream }
}

impl ConsoleWriter {
    fn write_real(&self, buf: &[u8]) -> io::Result<()> {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().lock().write_all(buf),
            ConsoleStream::Stderr => io::stderr().lock().write_all(buf),
        }
    }
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active_sink() {
            Some(sink) => {
                sink.append_console(buf);
                if sink.echo_console() {
                    // Echo is best effort; the captured copy is authoritative.
                    let _ = self.write_real(buf);
                }
            }
            None => self.write_real(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().flush(),
            ConsoleStream::Stderr => io::stderr().flush(),
        }
    }
}
