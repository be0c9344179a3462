//! MPV IPC module - spawns and controls an external MPV player via JSON IPC.
//!
//! Architecture:
//! - `process.rs` - MPV binary detection, process spawning and socket wait
//! - `protocol.rs` - JSON command/response types and serialization
//! - `ipc.rs` - One-shot connection to the Unix control socket
//! - `playlist.rs` - Cached playlist with the current-entry marker
//! - `client.rs` - High-level MPV client with command methods

mod client;
mod ipc;
mod playlist;
mod process;
mod protocol;

pub use client::{ClientOptions, ControlError, MpvClient, PendingReply};
pub use ipc::{ControlConnection, IpcError};
pub use playlist::{PlaylistEntry, PlaylistState};
pub use process::{cleanup_ipc, find_mpv, ipc_path, spawn_mpv, wait_for_socket, ProcessError};
pub use protocol::{
  decode, Command, CommandResult, DecodeError, Direction, PlaylistItem, PlaylistSnapshot,
  Response, ResponseShape, ResultData,
};
