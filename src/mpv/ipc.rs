//! One-shot IPC exchange with MPV.
//!
//! MPV pushes unsolicited events onto every client connection, so instead of
//! multiplexing one long-lived socket each command gets a fresh connection,
//! writes its line, and reads exactly one message back.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use super::protocol::{decode, Command, DecodeError, Response, ResponseShape};

#[derive(Error, Debug)]
pub enum IpcError {
  #[error("Connection failed: {0}")]
  Connect(#[source] std::io::Error),
  #[error("Write failed: {0}")]
  Write(#[source] std::io::Error),
  #[error("Read failed: {0}")]
  Read(#[source] std::io::Error),
  #[error("Decode failed: {0}")]
  Decode(#[from] DecodeError),
  #[error("Command timeout")]
  Timeout,
  #[error("Connection closed before a response arrived")]
  ConnectionClosed,
}

/// A single connection to the MPV control socket.
pub struct ControlConnection {
  stream: BufReader<UnixStream>,
}

impl ControlConnection {
  /// Connect to the control socket. Not retried.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self, IpcError> {
    let path = path.as_ref();
    let stream = UnixStream::connect(path).await.map_err(IpcError::Connect)?;
    log::debug!("Connected to MPV socket {}", path.display());
    Ok(Self {
      stream: BufReader::new(stream),
    })
  }

  /// Write one command line.
  pub async fn send(&mut self, cmd: &Command) -> Result<(), IpcError> {
    let line = cmd.encode();
    let writer = self.stream.get_mut();
    writer.write_all(&line).await.map_err(IpcError::Write)?;
    writer.flush().await.map_err(IpcError::Write)?;
    log::debug!(
      "MPV command written: {}",
      String::from_utf8_lossy(&line).trim_end()
    );
    Ok(())
  }

  /// Wait for one message and decode it as `shape`.
  ///
  /// Never reads past the first non-blank line. The connection is closed
  /// when this returns.
  pub async fn receive_one(
    mut self,
    shape: ResponseShape,
    timeout: Duration,
  ) -> Result<Response, IpcError> {
    match tokio::time::timeout(timeout, self.read_message()).await {
      Ok(Ok(line)) => Ok(decode(line.as_bytes(), shape)?),
      Ok(Err(e)) => Err(e),
      Err(_) => {
        log::error!("MPV response timeout after {:?}", timeout);
        Err(IpcError::Timeout)
      }
    }
  }

  async fn read_message(&mut self) -> Result<String, IpcError> {
    let mut line = String::new();
    loop {
      line.clear();
      match self.stream.read_line(&mut line).await {
        Ok(0) => return Err(IpcError::ConnectionClosed),
        Ok(_) if line.trim().is_empty() => continue,
        Ok(_) => return Ok(line),
        Err(e) => return Err(IpcError::Read(e)),
      }
    }
  }
}
