//! HTTP remote control surface.

mod handlers;
mod middleware;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::mpv::MpvClient;

pub use handlers::ErrorResponse;
pub use middleware::{RequestId, REQUEST_ID_HEADER};

/// Readiness flag reported by `/healthz`.
#[derive(Debug, Clone, Default)]
pub struct Health(Arc<AtomicBool>);

impl Health {
  pub fn is_ready(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }

  pub fn set_ready(&self, ready: bool) {
    self.0.store(ready, Ordering::SeqCst);
  }
}

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
  pub client: MpvClient,
  pub health: Health,
  /// User-Agent accepted on `/rofi`.
  pub launcher_agent: Arc<str>,
}

impl AppState {
  pub fn new(client: MpvClient, launcher_agent: &str) -> Self {
    Self {
      client,
      health: Health::default(),
      launcher_agent: Arc::from(launcher_agent),
    }
  }
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/req", get(handlers::append))
    .route("/playlist", get(handlers::playlist))
    .route("/play", get(handlers::play_index))
    .route("/control", get(handlers::control))
    .route("/healthz", get(handlers::healthz))
    .route("/rofi", get(handlers::launcher))
    .fallback(handlers::not_found)
    .layer(axum::middleware::from_fn(middleware::access_log))
    .layer(axum::middleware::from_fn(middleware::request_id))
    .with_state(state)
}

/// Serve until `shutdown` is cancelled. Health is set while serving and
/// cleared as soon as shutdown begins.
pub async fn serve(
  listener: TcpListener,
  state: AppState,
  shutdown: CancellationToken,
) -> std::io::Result<()> {
  let health = state.health.clone();
  let app = router(state);

  log::info!(
    "Server is ready to handle requests at {}",
    listener.local_addr()?
  );
  health.set_ready(true);

  axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      shutdown.cancelled().await;
      health.set_ready(false);
      log::info!("Server is shutting down...");
    })
    .await
}
