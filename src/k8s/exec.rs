//! Bidirectional exec stream sessions
//!
//! Wraps the stdin/stdout halves of a pod exec stream behind boxed async
//! traits so the production websocket stream and the in-memory test stream
//! look the same to the pod handle.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no open exec session")]
    NotConnected,
    #[error("exec session is already open")]
    AlreadyOpen,
    #[error("exec stream closed by the remote end")]
    Closed,
    #[error("no output within {0:?}")]
    ReadTimeout(Duration),
    #[error("exec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One open exec stream into a pod's shell.
///
/// Stderr is attached but never read here; the handle keeps the half alive
/// so the remote side can still write to it.
pub struct ExecSession {
    stdin: Box<dyn AsyncWrite + Send + Unpin>,
    stdout: Box<dyn AsyncRead + Send + Unpin>,
    _stderr: Option<Box<dyn AsyncRead + Send + Unpin>>,
}

impl ExecSession {
    pub fn new(
        stdin: Box<dyn AsyncWrite + Send + Unpin>,
        stdout: Box<dyn AsyncRead + Send + Unpin>,
        stderr: Option<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> Self {
        Self {
            stdin,
            stdout,
            _stderr: stderr,
        }
    }

    /// Write `command` plus a trailing newline to the shell's stdin, then
    /// poll stdout at `tick` intervals until the first chunk of output
    /// arrives or the stream closes.
    ///
    /// Returns the first available chunk only. The shell emits no
    /// end-of-output marker, so there is no defined point at which a
    /// command's output is "complete"; callers wanting more must send again
    /// or read the stream themselves. The whole wait is bounded by
    /// `deadline`.
    pub async fn send(
        &mut self,
        command: &str,
        tick: Duration,
        deadline: Duration,
    ) -> Result<String, ExecError> {
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        let start = Instant::now();
        let mut buf = vec![0u8; 8192];
        loop {
            match tokio::time::timeout(tick, self.stdout.read(&mut buf)).await {
                Ok(Ok(0)) => return Err(ExecError::Closed),
                Ok(Ok(n)) => return Ok(String::from_utf8_lossy(&buf[..n]).into_owned()),
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    if start.elapsed() >= deadline {
                        return Err(ExecError::ReadTimeout(deadline));
                    }
                }
            }
        }
    }

    /// Shut down the stream's input, ending the remote shell
    pub async fn close(mut self) -> Result<(), ExecError> {
        self.stdin.shutdown().await?;
        Ok(())
    }
}

impl std::fmt::Debug for ExecSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecSession").finish_non_exhaustive()
    }
}
