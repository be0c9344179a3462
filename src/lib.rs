use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub mod config;
pub mod mpv;
pub mod notify;
pub mod server;
pub mod ytdl;

pub use config::{AppConfig, ConfigError};
use mpv::{MpvClient, ProcessError};
use notify::Notifier;
use server::AppState;
use ytdl::YtDlp;

#[derive(Error, Debug)]
pub enum StartupError {
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error(transparent)]
  Process(#[from] ProcessError),
  #[error("Could not listen on port {0}: {1}")]
  Bind(u16, #[source] std::io::Error),
  #[error("Server error: {0}")]
  Serve(#[source] std::io::Error),
}

/// Start MPV, then serve the HTTP remote until Ctrl+C or until MPV exits.
pub async fn run(config: AppConfig) -> Result<(), StartupError> {
  let listener = TcpListener::bind(("0.0.0.0", config.port))
    .await
    .map_err(|e| StartupError::Bind(config.port, e))?;

  // Start MPV and wait for it to create the socket
  mpv::cleanup_ipc(&config.socket_path);
  let mut child = mpv::spawn_mpv(
    config.mpv_path().as_ref(),
    &config.socket_path,
    &config.mpv_args,
  )?;
  mpv::wait_for_socket(&config.socket_path, config.socket_wait()).await?;

  let metadata = Arc::new(YtDlp::new(config.metadata_program.as_str()));
  let mut client = MpvClient::new(config.client_options(), metadata);
  if config.notify {
    client = client.with_notifier(Notifier::desktop(config.notify_program.as_str()));
  }
  log::info!("MPV client ready on {}", config.socket_path.display());

  let shutdown = CancellationToken::new();

  let token = shutdown.clone();
  tokio::spawn(async move {
    if let Err(e) = tokio::signal::ctrl_c().await {
      log::error!("Failed to listen for Ctrl+C: {}", e);
      return;
    }
    token.cancel();
  });

  let token = shutdown.clone();
  let player = tokio::spawn(async move {
    let exited = tokio::select! {
      status = child.wait() => Some(status),
      _ = token.cancelled() => None,
    };
    match exited {
      Some(Ok(status)) => log::info!("MPV process exited with: {}", status),
      Some(Err(e)) => log::error!("wait() failed: {}", e),
      None => {
        if let Err(e) = child.kill().await {
          log::error!("kill() failed: {}", e);
        }
        return;
      }
    }
    token.cancel();
  });

  let state = AppState::new(client, &config.launcher_agent);
  let served = server::serve(listener, state, shutdown.clone()).await;

  shutdown.cancel();
  if let Err(e) = player.await {
    log::error!("MPV watcher task failed: {}", e);
  }
  mpv::cleanup_ipc(&config.socket_path);

  served.map_err(StartupError::Serve)?;
  log::info!("Server stopped");
  Ok(())
}
