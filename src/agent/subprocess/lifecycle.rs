//! Lifecycle management for the bridge process (spawn, close)

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::FramedRead;

use crate::error::AgentError;

use super::codec::BridgeLines;
use super::command::CommandBuilder;
use super::config::{EXIT_GRACE_PERIOD, STDERR_DRAIN_TIMEOUT};
use super::exchange::forward_stderr;
use super::transport::SubprocessAgent;

impl SubprocessAgent {
    /// Spawn the bridge process and set up its pipes
    ///
    /// # Errors
    /// Returns error if spawning fails or stdio handles cannot be obtained
    pub(super) fn connect_impl(&mut self) -> Result<(), AgentError> {
        if self.process.is_some() {
            return Ok(());
        }

        let mut cmd = CommandBuilder::new(&self.program, &self.config, &self.launch.api_key).build();

        let mut child = cmd.spawn().map_err(|e| {
            if let Some(ref cwd) = self.config.cwd
                && !cwd.exists()
            {
                return AgentError::failed(format!(
                    "Bridge working directory does not exist: {}",
                    cwd.display()
                ));
            }
            AgentError::failed(format!("Failed to start bridge: {e}"))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::failed("Failed to get bridge stdin handle"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::failed("Failed to get bridge stdout handle"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AgentError::failed("Failed to get bridge stderr handle"))?;

        log::debug!(
            "Spawned bridge {} (pid {:?})",
            self.program.display(),
            child.id()
        );

        self.stdin = Some(stdin);
        let max = self.config.max_frame_size;
        self.stdout = Some(FramedRead::new(stdout, BridgeLines::new(max)));
        self.stderr = Some(FramedRead::new(stderr, BridgeLines::new(max)));
        self.process = Some(child);

        Ok(())
    }

    /// Close the bridge and reap the process
    ///
    /// Stdin is closed first; a process still alive after the grace period is
    /// killed. Stderr is forwarded until it closes while the process exits.
    ///
    /// # Errors
    /// Returns error if waiting on the process fails
    pub(super) async fn close_impl(&mut self) -> Result<(), AgentError> {
        if let Some(mut stdin) = self.stdin.take() {
            let _ = stdin.shutdown().await;
        }

        self.stdout = None;
        let mut stderr = self.stderr.take();

        let Some(mut child) = self.process.take() else {
            return Ok(());
        };

        let exited = async {
            match tokio::time::timeout(EXIT_GRACE_PERIOD, child.wait()).await {
                Ok(Ok(status)) => {
                    log::debug!("Bridge exited with {status}");
                    Ok(())
                }
                Ok(Err(e)) => Err(AgentError::Io(e)),
                Err(_) => {
                    log::warn!(
                        "Bridge did not exit within {}s; killing it",
                        EXIT_GRACE_PERIOD.as_secs()
                    );
                    let _ = child.kill().await;
                    Ok(())
                }
            }
        };

        // Stderr hits EOF once the process is gone, unless a grandchild
        // still holds it open
        let drained = tokio::time::timeout(EXIT_GRACE_PERIOD + STDERR_DRAIN_TIMEOUT, async {
            while let Some(reader) = stderr.as_mut() {
                let frame = reader.next().await;
                forward_stderr(&mut stderr, frame);
            }
        });

        let (result, _) = tokio::join!(exited, drained);
        result
    }

    /// Handle Drop cleanup
    pub(super) fn drop_impl(&mut self) {
        self.stdin = None;
        self.stdout = None;
        self.stderr = None;

        if let Some(mut child) = self.process.take() {
            let _ = child.start_kill();
        }
    }
}
