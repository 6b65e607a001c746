//! Line framing for the bridge's output pipes

use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

/// One frame read from a bridge pipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Frame {
    /// A complete line, without its terminator
    Line(String),
    /// A line longer than the frame limit; its bytes are discarded
    Oversized,
}

/// `LinesCodec` that reports oversized lines as frames instead of errors
///
/// `FramedRead` ends the stream after any decoder error. `LinesCodec` itself
/// recovers from an oversized line by discarding up to the next newline, so
/// surfacing it as [`Frame::Oversized`] keeps the pipe readable.
#[derive(Debug, Clone)]
pub(super) struct BridgeLines {
    inner: LinesCodec,
}

impl BridgeLines {
    pub(super) fn new(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
        }
    }

    pub(super) fn max_length(&self) -> usize {
        self.inner.max_length()
    }
}

fn frame(decoded: Result<Option<String>, LinesCodecError>) -> Result<Option<Frame>, LinesCodecError> {
    match decoded {
        Ok(line) => Ok(line.map(Frame::Line)),
        Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Frame::Oversized)),
        Err(e) => Err(e),
    }
}

impl Decoder for BridgeLines {
    type Item = Frame;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        frame(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        frame(self.inner.decode_eof(buf))
    }
}
