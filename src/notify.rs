//! Fire-and-forget desktop notifications.

use async_channel::{Receiver, Sender};
use tokio::process::Command;

/// Handle for queueing notification messages.
#[derive(Debug, Clone)]
pub struct Notifier {
  tx: Sender<String>,
}

impl Notifier {
  /// Create a notifier and the receiving end of its queue.
  pub fn channel() -> (Self, Receiver<String>) {
    let (tx, rx) = async_channel::unbounded();
    (Self { tx }, rx)
  }

  /// Create a notifier whose messages are shown with `notify-send`.
  pub fn desktop(program: impl Into<String>) -> Self {
    let (notifier, rx) = Self::channel();
    let program = program.into();
    tokio::spawn(async move {
      Self::worker_loop(program, rx).await;
    });
    notifier
  }

  async fn worker_loop(program: String, rx: Receiver<String>) {
    while let Ok(msg) = rx.recv().await {
      let result = Command::new(&program)
        .args(["-i", "mpv", "-a", "mpv", msg.as_str()])
        .status()
        .await;
      match result {
        Ok(status) if status.success() => {}
        Ok(status) => log::warn!("{} exited with {}", program, status),
        Err(e) => log::error!("{} failed: {}", program, e),
      }
    }
    log::debug!("Notification worker stopped");
  }

  /// Queue a message. Never fails the caller.
  pub fn notify(&self, msg: impl Into<String>) {
    if let Err(e) = self.tx.try_send(msg.into()) {
      log::warn!("Dropping notification: {}", e);
    }
  }
}
