//! MPV JSON IPC protocol types.
//!
//! Reference: https://mpv.io/manual/master/#json-ipc
//!
//! Requests are one JSON object per line with the command tokens under
//! `command`. Responses come back the same way, but their shape depends on
//! the command that was sent, so decoding is always told which shape to
//! expect.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

const LOADFILE: &str = "loadfile";
const APPEND_PLAY: &str = "append-play";
const GET_PROPERTY: &str = "get_property";
const PLAYLIST: &str = "playlist";
const PLAYLIST_NEXT: &str = "playlist-next";
const PLAYLIST_PREV: &str = "playlist-prev";
const PLAYLIST_PLAY_INDEX: &str = "playlist-play-index";
const CYCLE: &str = "cycle";
const PAUSE: &str = "pause";

/// Status string MPV puts in `error` when a command succeeded.
pub const SUCCESS: &str = "success";

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("Malformed response: {0}")]
  Json(#[from] serde_json::Error),
  #[error("Received event '{0}' instead of a response")]
  UnexpectedEvent(String),
  #[error("Playlist response carries no playlist data")]
  MissingPlaylist,
  #[error("Response data does not match the expected {0:?} layout")]
  ShapeMismatch(ResponseShape),
}

/// Playlist navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Next,
  Previous,
}

/// Command sent to MPV via IPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Append a file/URL to the playlist, starting playback if idle.
  Append { url: String, async_exec: bool },
  /// Jump to a playlist position.
  PlayIndex(usize),
  /// Move to the next or previous playlist entry.
  NextPrev(Direction),
  /// Cycle the pause property.
  PauseToggle,
  /// Read the whole `playlist` property.
  PlaylistQuery,
}

/// Which of the two response layouts a command produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
  CommandResult,
  PlaylistSnapshot,
}

impl Command {
  /// Append `url` as an asynchronous `loadfile`.
  pub fn append(url: impl Into<String>) -> Self {
    Command::Append {
      url: url.into(),
      async_exec: true,
    }
  }

  fn tokens(&self) -> Vec<String> {
    match self {
      Command::Append { url, .. } => vec![LOADFILE.into(), url.clone(), APPEND_PLAY.into()],
      Command::PlayIndex(index) => vec![PLAYLIST_PLAY_INDEX.into(), index.to_string()],
      Command::NextPrev(Direction::Next) => vec![PLAYLIST_NEXT.into()],
      Command::NextPrev(Direction::Previous) => vec![PLAYLIST_PREV.into()],
      Command::PauseToggle => vec![CYCLE.into(), PAUSE.into()],
      Command::PlaylistQuery => vec![GET_PROPERTY.into(), PLAYLIST.into()],
    }
  }

  /// Serialize to a newline-terminated JSON line.
  pub fn encode(&self) -> Vec<u8> {
    let value = match self {
      Command::Append {
        async_exec: true, ..
      } => json!({ "command": self.tokens(), "async": true }),
      _ => json!({ "command": self.tokens() }),
    };
    let mut line = value.to_string().into_bytes();
    line.push(b'\n');
    line
  }

  pub fn expected_shape(&self) -> ResponseShape {
    match self {
      Command::PlaylistQuery => ResponseShape::PlaylistSnapshot,
      _ => ResponseShape::CommandResult,
    }
  }

  /// Short name used in log lines.
  pub fn name(&self) -> &'static str {
    match self {
      Command::Append { .. } => "append",
      Command::PlayIndex(_) => "play index",
      Command::NextPrev(Direction::Next) => "next",
      Command::NextPrev(Direction::Previous) => "prev",
      Command::PauseToggle => "pause toggle",
      Command::PlaylistQuery => "playlist",
    }
  }
}

/// Command-specific payload of a [`CommandResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultData {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub playlist_entry_id: Option<i64>,
}

/// Response to any command other than a playlist query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
  #[serde(default)]
  pub data: Option<ResultData>,
  /// "success" or error message.
  pub error: String,
  #[serde(default)]
  pub request_id: i64,
}

impl CommandResult {
  pub fn is_success(&self) -> bool {
    self.error == SUCCESS
  }

  /// Playlist entry id assigned by MPV to an appended file.
  pub fn entry_id(&self) -> Option<i64> {
    self.data.as_ref().and_then(|d| d.playlist_entry_id)
  }
}

/// One element of MPV's `playlist` property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
  #[serde(default)]
  pub id: i64,
  #[serde(default)]
  pub filename: String,
  #[serde(default)]
  pub current: bool,
  #[serde(default)]
  pub playing: bool,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub thumbnail: String,
}

/// Response to a playlist query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSnapshot {
  #[serde(default)]
  pub data: Option<Vec<PlaylistItem>>,
  pub error: String,
}

impl PlaylistSnapshot {
  pub fn is_success(&self) -> bool {
    self.error == SUCCESS
  }

  pub fn items(&self) -> &[PlaylistItem] {
    self.data.as_deref().unwrap_or_default()
  }
}

/// Decoded MPV response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
  CommandResult(CommandResult),
  PlaylistSnapshot(PlaylistSnapshot),
}

impl Response {
  pub fn is_success(&self) -> bool {
    match self {
      Response::CommandResult(r) => r.is_success(),
      Response::PlaylistSnapshot(s) => s.is_success(),
    }
  }

  pub fn shape(&self) -> ResponseShape {
    match self {
      Response::CommandResult(_) => ResponseShape::CommandResult,
      Response::PlaylistSnapshot(_) => ResponseShape::PlaylistSnapshot,
    }
  }
}

/// Decode exactly one JSON message as the given response shape.
///
/// Events that MPV broadcasts to every client are rejected, as is anything
/// whose layout does not fit `shape`.
pub fn decode(bytes: &[u8], shape: ResponseShape) -> Result<Response, DecodeError> {
  let value: serde_json::Value = serde_json::from_slice(bytes)?;

  if let Some(event) = value.get("event") {
    let name = event.as_str().unwrap_or_default().to_string();
    return Err(DecodeError::UnexpectedEvent(name));
  }

  let data_fits = match (shape, value.get("data")) {
    (_, None) | (_, Some(serde_json::Value::Null)) => true,
    (ResponseShape::CommandResult, Some(data)) => data.is_object(),
    (ResponseShape::PlaylistSnapshot, Some(data)) => data.is_array(),
  };
  if !data_fits {
    return Err(DecodeError::ShapeMismatch(shape));
  }

  match shape {
    ResponseShape::CommandResult => Ok(Response::CommandResult(serde_json::from_value(value)?)),
    ResponseShape::PlaylistSnapshot => {
      let snapshot: PlaylistSnapshot = serde_json::from_value(value)?;
      if snapshot.is_success() && snapshot.data.is_none() {
        return Err(DecodeError::MissingPlaylist);
      }
      Ok(Response::PlaylistSnapshot(snapshot))
    }
  }
}
