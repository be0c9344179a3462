//! MPV process detection and spawning.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::{Child, Command};

#[derive(Error, Debug)]
pub enum ProcessError {
  #[error("MPV executable not found")]
  NotFound,
  #[error("Failed to spawn MPV: {0}")]
  SpawnFailed(#[from] std::io::Error),
  #[error("Socket file not created after {0:?}: {1}")]
  SocketMissing(Duration, PathBuf),
}

/// Default IPC socket path for MPV.
pub fn ipc_path() -> PathBuf {
  std::env::temp_dir().join("mpv.sock")
}

/// Find MPV executable in common locations.
pub fn find_mpv() -> Option<PathBuf> {
  // Check PATH first
  if let Ok(path) = which::which("mpv") {
    return Some(path);
  }

  #[cfg(target_os = "macos")]
  {
    let common_paths = [
      "/usr/local/bin/mpv",
      "/opt/homebrew/bin/mpv",
      "/Applications/mpv.app/Contents/MacOS/mpv",
    ];
    for path in common_paths {
      let p = PathBuf::from(path);
      if p.exists() {
        return Some(p);
      }
    }
  }

  #[cfg(target_os = "linux")]
  {
    let common_paths = ["/usr/bin/mpv", "/usr/local/bin/mpv"];
    for path in common_paths {
      let p = PathBuf::from(path);
      if p.exists() {
        return Some(p);
      }
    }
  }

  None
}

/// Build the MPV command line: an idle player serving IPC on `socket`.
fn mpv_command(mpv_exe: &Path, socket: &Path, extra_args: &[String]) -> Command {
  let mut cmd = Command::new(mpv_exe);
  cmd
    .arg(format!("--input-ipc-server={}", socket.display()))
    .arg("--idle");

  // Add user-specified extra arguments
  for arg in extra_args {
    cmd.arg(arg);
  }
  cmd
}

/// Spawn MPV process with IPC server enabled.
pub fn spawn_mpv(
  mpv_path: Option<&PathBuf>,
  socket: &Path,
  extra_args: &[String],
) -> Result<Child, ProcessError> {
  let mpv_exe = mpv_path
    .cloned()
    .or_else(find_mpv)
    .ok_or(ProcessError::NotFound)?;

  log::info!("Spawning MPV: {:?} with IPC: {}", mpv_exe, socket.display());
  if !extra_args.is_empty() {
    log::info!("Extra MPV args: {:?}", extra_args);
  }

  let child = mpv_command(&mpv_exe, socket, extra_args)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .kill_on_drop(true)
    .spawn()?;

  Ok(child)
}

/// Remove a stale socket left by a previous run.
pub fn cleanup_ipc(socket: &Path) {
  if socket.exists() {
    log::debug!("Removing stale socket {}", socket.display());
    let _ = std::fs::remove_file(socket);
  }
}

/// Wait until the control socket exists, polling every 100ms.
pub async fn wait_for_socket(socket: &Path, limit: Duration) -> Result<(), ProcessError> {
  let poll = async {
    while !socket.exists() {
      tokio::time::sleep(Duration::from_millis(100)).await;
    }
  };
  tokio::time::timeout(limit, poll)
    .await
    .map_err(|_| ProcessError::SocketMissing(limit, socket.to_path_buf()))
}
