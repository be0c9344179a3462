//! Locally cached view of MPV's playlist.
//!
//! Entries are kept in the order MPV accepted them. MPV hands out increasing
//! `playlist_entry_id`s, so an entry whose reply arrives late is still slotted
//! in front of entries with higher ids. Entries are only ever added: clearing
//! the playlist on the MPV side is not reflected here and the cache goes stale
//! until the process restarts.

use parking_lot::RwLock;
use serde::Serialize;

use super::protocol::PlaylistItem;
use crate::ytdl::VideoInfo;

/// Playlist entry as served to HTTP clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaylistEntry {
  pub id: i64,
  pub filename: String,
  pub current: bool,
  pub playing: bool,
  pub title: String,
  pub thumbnail: String,
}

impl PlaylistEntry {
  pub fn new(filename: impl Into<String>) -> Self {
    Self {
      filename: filename.into(),
      ..Default::default()
    }
  }
}

/// Playlist cache. All mutation goes through the lock.
#[derive(Debug, Default)]
pub struct PlaylistState {
  entries: RwLock<Vec<PlaylistEntry>>,
}

impl PlaylistState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.read().is_empty()
  }

  /// Clone of the current entries.
  pub fn entries(&self) -> Vec<PlaylistEntry> {
    self.entries.read().clone()
  }

  /// Add an entry, returning the new length.
  ///
  /// Entries without an id (0) go to the end. Others are placed before the
  /// first entry carrying a higher id.
  pub fn push(&self, entry: PlaylistEntry) -> usize {
    let mut entries = self.entries.write();
    let at = match entry.id {
      0 => entries.len(),
      id => entries
        .iter()
        .position(|e| e.id > id)
        .unwrap_or(entries.len()),
    };
    entries.insert(at, entry);
    entries.len()
  }

  /// Fill in title and thumbnail of the entry added for `filename` with `id`.
  /// Returns false if no such entry exists.
  pub fn update_metadata(&self, id: i64, filename: &str, info: VideoInfo) -> bool {
    let mut entries = self.entries.write();
    match entries
      .iter_mut()
      .find(|e| e.id == id && e.filename == filename)
    {
      Some(entry) => {
        entry.title = info.title;
        entry.thumbnail = info.thumbnail;
        true
      }
      None => false,
    }
  }

  /// Re-derive `current` and `playing` from a playlist snapshot.
  ///
  /// Snapshot items are matched to local entries by index. Only the first
  /// item flagged current counts, and items past the end of the local list
  /// are ignored.
  pub fn apply_snapshot(&self, items: &[PlaylistItem]) {
    let mut entries = self.entries.write();
    let current = items
      .iter()
      .position(|item| item.current)
      .filter(|&i| i < entries.len());

    for (i, entry) in entries.iter_mut().enumerate() {
      entry.current = current == Some(i);
      entry.playing = entry.current && items[i].playing;
    }
  }

  /// Rofi script-mode rows: title, then the index in the `info` field.
  pub fn launcher_text(&self) -> String {
    self
      .entries
      .read()
      .iter()
      .enumerate()
      .map(|(i, e)| format!("{}\0info\x1f{}\n", e.title, i))
      .collect()
  }
}
