//! Request/response exchange with the bridge
//!
//! Events that arrive while a request is outstanding are replayed in this
//! process as they are read: console text through the console writers, log
//! records through `log` under [`BRIDGE_LOG_TARGET`]. Raw stderr is read in
//! the same loop. All of it therefore lands in whichever capture window is
//! open for the request.

use std::io::Write;

use futures::{FutureExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodecError};

use crate::capture::console;
use crate::error::AgentError;
use crate::types::RequestId;

use super::codec::{BridgeLines, Frame};
use super::protocol::{BridgeEvent, BridgeOp, BridgeRequest, BridgeResponse, parse_level};
use super::transport::SubprocessAgent;

/// Log target for records replayed from the bridge
pub const BRIDGE_LOG_TARGET: &str = "act_control::bridge";

impl SubprocessAgent {
    /// Send one request and wait for its response
    ///
    /// Stderr the bridge wrote before answering is forwarded before this
    /// returns.
    ///
    /// # Errors
    /// - the bridge's own failure, when it answers with `ok: false`
    /// - [`AgentError::Failed`] when the bridge exits before answering
    /// - [`AgentError::Io`] when the pipes fail
    pub(super) async fn request(&mut self, op: BridgeOp) -> Result<BridgeResponse, AgentError> {
        let request = BridgeRequest::new(op);
        let line = request.to_line()?;
        let name = request.op.name();

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| AgentError::failed("Bridge is not running"))?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        log::trace!("Sent `{name}` request {}", request.id.as_str());

        let Self { stdout, stderr, .. } = self;
        let stdout = stdout
            .as_mut()
            .ok_or_else(|| AgentError::failed("Bridge is not running"))?;

        let outcome = loop {
            tokio::select! {
                biased;

                frame = next_frame(stderr), if stderr.is_some() => {
                    forward_stderr(stderr, frame);
                }
                frame = stdout.next() => match frame {
                    None => {
                        break Err(AgentError::failed(format!(
                            "Bridge exited before answering `{name}`"
                        )));
                    }
                    Some(Ok(Frame::Oversized)) => {
                        log::warn!(
                            "Dropped bridge output line longer than {} bytes",
                            stdout.decoder().max_length()
                        );
                    }
                    Some(Ok(Frame::Line(line))) => {
                        if let Some(response) = route_line(&line, &request.id) {
                            break Ok(response);
                        }
                    }
                    Some(Err(e)) => break Err(pipe_error(e)),
                },
            }
        };

        // Stderr written before the response is readable by now; give the
        // reactor a turn to observe it, then take whatever is ready
        tokio::task::yield_now().await;
        drain_ready_stderr(stderr);

        outcome?.into_result()
    }
}

/// Next frame from an optional pipe; pending forever once it is gone
async fn next_frame<R>(
    reader: &mut Option<FramedRead<R, BridgeLines>>,
) -> Option<Result<Frame, LinesCodecError>>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.next().await,
        None => std::future::pending().await,
    }
}

/// Forward one stderr frame, closing the reader at EOF or on error
pub(super) fn forward_stderr<R>(
    reader: &mut Option<FramedRead<R, BridgeLines>>,
    frame: Option<Result<Frame, LinesCodecError>>,
) {
    match frame {
        Some(Ok(Frame::Line(line))) => {
            let _ = writeln!(console::stderr(), "{line}");
        }
        Some(Ok(Frame::Oversized)) => {
            if let Some(reader) = reader {
                log::warn!(
                    "Dropped bridge stderr line longer than {} bytes",
                    reader.decoder().max_length()
                );
            }
        }
        Some(Err(e)) => {
            log::debug!("Stopped reading bridge stderr: {e}");
            *reader = None;
        }
        None => *reader = None,
    }
}

/// Forward every stderr frame that is ready without waiting
fn drain_ready_stderr<R>(reader: &mut Option<FramedRead<R, BridgeLines>>)
where
    R: AsyncRead + Unpin,
{
    loop {
        let Some(ready) = reader.as_mut() else { break };
        let Some(frame) = ready.next().now_or_never() else { break };
        forward_stderr(reader, frame);
    }
}

fn pipe_error(error: LinesCodecError) -> AgentError {
    match error {
        LinesCodecError::Io(e) => AgentError::Io(e),
        LinesCodecError::MaxLineLengthExceeded => {
            AgentError::protocol("bridge output line exceeded the frame limit")
        }
    }
}

/// Replay one stdout line, returning it if it is the awaited response
///
/// Lines that are not protocol events are passed through to console stdout
/// unchanged. Responses to other requests are logged and dropped.
pub(super) fn route_line(line: &str, expected: &RequestId) -> Option<BridgeResponse> {
    if line.trim().is_empty() {
        return None;
    }

    let event = match line.parse::<BridgeEvent>() {
        Ok(event) => event,
        Err(_) => {
            let _ = writeln!(console::stdout(), "{line}");
            return None;
        }
    };

    match event {
        BridgeEvent::Console { stream, text } => {
            let _ = console::writer(stream).write_all(text.as_bytes());
            None
        }
        BridgeEvent::Log {
            level,
            target,
            message,
        } => {
            let level = parse_level(&level);
            match target {
                Some(target) => log::log!(target: BRIDGE_LOG_TARGET, level, "[{target}] {message}"),
                None => log::log!(target: BRIDGE_LOG_TARGET, level, "{message}"),
            }
            None
        }
        BridgeEvent::Response(response) if response.id == *expected => Some(response),
        BridgeEvent::Response(response) => {
            log::warn!(
                "Ignoring bridge response for unknown request {}",
                response.id.as_str()
            );
            None
        }
    }
}
