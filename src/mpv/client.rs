//! High-level MPV client with command methods.
//!
//! Every command opens its own connection, writes the command and hands the
//! connection to a spawned task that waits for the single response. The
//! command methods return as soon as the command is written; the response
//! arrives through the returned [`PendingReply`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::ipc::{ControlConnection, IpcError};
use super::playlist::{PlaylistEntry, PlaylistState};
use super::process::ipc_path;
use super::protocol::{Command, Direction, Response};
use crate::notify::Notifier;
use crate::ytdl::MetadataSource;

#[derive(Error, Debug)]
pub enum ControlError {
  #[error("IPC error: {0}")]
  Ipc(#[from] IpcError),
  #[error("{0}")]
  Validation(String),
  #[error("Response task ended without replying")]
  Abandoned,
}

type Reply = Result<Response, ControlError>;

/// Response of a command that is still in flight.
#[must_use]
pub struct PendingReply {
  reply: oneshot::Receiver<Reply>,
  task: JoinHandle<()>,
}

impl PendingReply {
  /// Wait for the response.
  pub async fn wait(self) -> Reply {
    self
      .reply
      .await
      .unwrap_or_else(|_| Err(ControlError::Abandoned))
  }

  /// Wait for the response and for every side effect of the command,
  /// including the playlist update that follows an append.
  pub async fn settled(self) -> Reply {
    let reply = self
      .reply
      .await
      .unwrap_or_else(|_| Err(ControlError::Abandoned));
    if let Err(e) = self.task.await {
      log::error!("MPV response task failed: {}", e);
    }
    reply
  }
}

/// Connection settings for [`MpvClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
  pub socket_path: PathBuf,
  /// Upper bound on waiting for one response.
  pub response_timeout: Duration,
  /// Pause after writing a command before returning. Zero disables it.
  pub courtesy_delay: Duration,
  /// Upper bound on the title/thumbnail lookup after an append.
  pub metadata_timeout: Duration,
}

impl Default for ClientOptions {
  fn default() -> Self {
    Self {
      socket_path: ipc_path(),
      response_timeout: Duration::from_secs(5),
      courtesy_delay: Duration::ZERO,
      metadata_timeout: Duration::from_secs(30),
    }
  }
}

/// High-level MPV client.
#[derive(Clone)]
pub struct MpvClient {
  options: Arc<ClientOptions>,
  playlist: Arc<PlaylistState>,
  metadata: Arc<dyn MetadataSource>,
  notifier: Option<Notifier>,
}

impl MpvClient {
  /// Create a new MPV client with an empty playlist.
  pub fn new(options: ClientOptions, metadata: Arc<dyn MetadataSource>) -> Self {
    Self {
      options: Arc::new(options),
      playlist: Arc::new(PlaylistState::new()),
      metadata,
      notifier: None,
    }
  }

  /// Announce successful appends through `notifier`.
  pub fn with_notifier(mut self, notifier: Notifier) -> Self {
    self.notifier = Some(notifier);
    self
  }

  pub fn playlist_len(&self) -> usize {
    self.playlist.len()
  }

  /// Cached playlist, without asking MPV.
  pub fn playlist(&self) -> Vec<PlaylistEntry> {
    self.playlist.entries()
  }

  /// Cached playlist rendered for rofi.
  pub fn playlist_text(&self) -> String {
    self.playlist.launcher_text()
  }

  /// Append a URL to the playlist.
  ///
  /// Once MPV accepts it the URL is added to the cached playlist right
  /// away; its title and thumbnail are filled in when the lookup finishes.
  pub async fn append(&self, url: &str) -> Result<PendingReply, ControlError> {
    validate_url(url)?;
    log::info!("Appending: {}", url);
    self.dispatch(Command::append(url)).await
  }

  /// Jump to a playlist index. Indexes outside the cached playlist are
  /// rejected without contacting MPV.
  pub async fn play_index(&self, index: usize) -> Result<PendingReply, ControlError> {
    if index >= self.playlist.len() {
      return Err(ControlError::Validation(format!("invalid index: {}", index)));
    }
    self.dispatch(Command::PlayIndex(index)).await
  }

  pub async fn step(&self, direction: Direction) -> Result<PendingReply, ControlError> {
    self.dispatch(Command::NextPrev(direction)).await
  }

  pub async fn toggle_pause(&self) -> Result<PendingReply, ControlError> {
    self.dispatch(Command::PauseToggle).await
  }

  /// Ask MPV for its playlist; the reply updates the current marker.
  pub async fn query_playlist(&self) -> Result<PendingReply, ControlError> {
    self.dispatch(Command::PlaylistQuery).await
  }

  /// Query MPV, then return the updated cached playlist.
  pub async fn refresh_playlist(&self) -> Result<Vec<PlaylistEntry>, ControlError> {
    let response = self.query_playlist().await?.wait().await?;
    if !response.is_success() {
      log::warn!("Playlist query failed: {:?}", response);
    }
    Ok(self.playlist.entries())
  }

  async fn dispatch(&self, cmd: Command) -> Result<PendingReply, ControlError> {
    let mut conn = ControlConnection::open(&self.options.socket_path)
      .await
      .inspect_err(|e| log::error!("Can't connect to socket: {}", e))?;
    conn.send(&cmd).await?;

    let (tx, rx) = oneshot::channel();
    let client = self.clone();
    let task = tokio::spawn(async move {
      client.await_response(cmd, conn, tx).await;
    });

    if !self.options.courtesy_delay.is_zero() {
      tokio::time::sleep(self.options.courtesy_delay).await;
    }

    Ok(PendingReply { reply: rx, task })
  }

  async fn await_response(
    self,
    cmd: Command,
    conn: ControlConnection,
    reply: oneshot::Sender<Reply>,
  ) {
    let response = match conn
      .receive_one(cmd.expected_shape(), self.options.response_timeout)
      .await
    {
      Ok(response) => response,
      Err(e) => {
        log::warn!("Can't read {} response: {}", cmd.name(), e);
        let _ = reply.send(Err(e.into()));
        return;
      }
    };
    log::debug!("{} response: {:?}", cmd.name(), response);

    let appended = match (&cmd, &response) {
      (Command::PlaylistQuery, Response::PlaylistSnapshot(snapshot)) if snapshot.is_success() => {
        self.playlist.apply_snapshot(snapshot.items());
        None
      }
      (Command::Append { url, .. }, Response::CommandResult(result)) if result.is_success() => {
        let entry = PlaylistEntry {
          id: result.entry_id().unwrap_or_default(),
          ..PlaylistEntry::new(url.as_str())
        };
        let id = entry.id;
        let len = self.playlist.push(entry);
        log::info!("Playlist now has {} entries", len);
        Some((url.clone(), id))
      }
      _ => None,
    };

    let _ = reply.send(Ok(response));

    if let Some((url, entry_id)) = appended {
      self.track_appended(url, entry_id).await;
    }
  }

  async fn track_appended(&self, url: String, entry_id: i64) {
    if let Some(notifier) = &self.notifier {
      notifier.notify(format!("vid #{} just added", entry_id));
    }

    let lookup = tokio::time::timeout(self.options.metadata_timeout, self.metadata.fetch(&url));
    match lookup.await {
      Ok(Ok(info)) => {
        if !self.playlist.update_metadata(entry_id, &url, info) {
          log::warn!("Entry for {} is gone, dropping its metadata", url);
        }
      }
      Ok(Err(e)) => log::warn!("Can't fetch metadata for {}: {}", url, e),
      Err(_) => log::warn!(
        "Metadata lookup for {} timed out after {:?}",
        url,
        self.options.metadata_timeout
      ),
    }
  }
}

/// Accept http(s) URLs with a dotted host and a non-empty path.
fn validate_url(raw: &str) -> Result<(), ControlError> {
  let invalid = || ControlError::Validation("invalid url".to_string());
  let url = url::Url::parse(raw).map_err(|_| invalid())?;

  let scheme_ok = matches!(url.scheme(), "http" | "https");
  let host_ok = url.host_str().is_some_and(|h| h.contains('.'));
  let path_ok = url.path().len() > 1;

  if scheme_ok && host_ok && path_ok {
    Ok(())
  } else {
    Err(invalid())
  }
}
