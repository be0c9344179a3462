//! HTTP handlers. Each one turns a query string into an [`MpvClient`] call.
//!
//! [`MpvClient`]: crate::mpv::MpvClient

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_TYPE, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::mpv::{ControlError, Direction, IpcError, PlaylistEntry, Response};

/// Error body returned to HTTP clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
  pub error: bool,
  pub message: String,
}

/// Handler error rendered as an [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError {
  status: StatusCode,
  message: String,
}

impl ApiError {
  fn bad_request(message: &str) -> Self {
    Self {
      status: StatusCode::BAD_REQUEST,
      message: message.to_string(),
    }
  }
}

impl From<ControlError> for ApiError {
  fn from(e: ControlError) -> Self {
    let status = match &e {
      ControlError::Validation(_) => StatusCode::BAD_REQUEST,
      ControlError::Ipc(IpcError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
      _ => StatusCode::BAD_GATEWAY,
    };
    Self {
      status,
      message: e.to_string(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> HttpResponse {
    let body = ErrorResponse {
      error: true,
      message: self.message,
    };
    (self.status, Json(body)).into_response()
  }
}

#[derive(Debug, Deserialize)]
pub struct AppendParams {
  u: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IndexParams {
  index: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ControlParams {
  action: Option<String>,
}

fn parse_index(raw: Option<&str>) -> Option<usize> {
  raw.and_then(|i| i.parse::<usize>().ok())
}

pub async fn not_found() -> StatusCode {
  StatusCode::NOT_FOUND
}

/// `GET /req?u=<url>`
pub async fn append(
  State(state): State<AppState>,
  Query(params): Query<AppendParams>,
) -> Result<Json<Response>, ApiError> {
  let url = params.u.ok_or_else(|| ApiError::bad_request("invalid url"))?;
  let response = state.client.append(&url).await?.wait().await?;
  Ok(Json(response))
}

/// `GET /playlist`
pub async fn playlist(State(state): State<AppState>) -> Result<Json<Vec<PlaylistEntry>>, ApiError> {
  Ok(Json(state.client.refresh_playlist().await?))
}

/// `GET /play?index=<n>`
pub async fn play_index(
  State(state): State<AppState>,
  Query(params): Query<IndexParams>,
) -> Result<Json<Response>, ApiError> {
  let index =
    parse_index(params.index.as_deref()).ok_or_else(|| ApiError::bad_request("invalid index"))?;
  let response = state.client.play_index(index).await?.wait().await?;
  Ok(Json(response))
}

/// `GET /control?action=pause|play|next|prev`
pub async fn control(
  State(state): State<AppState>,
  Query(params): Query<ControlParams>,
) -> Result<Json<Response>, ApiError> {
  let pending = match params.action.as_deref() {
    Some("pause") | Some("play") => state.client.toggle_pause().await?,
    Some("next") => state.client.step(Direction::Next).await?,
    Some("prev") => state.client.step(Direction::Previous).await?,
    _ => return Err(ApiError::bad_request("unknown action")),
  };
  Ok(Json(pending.wait().await?))
}

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> StatusCode {
  if state.health.is_ready() {
    StatusCode::NO_CONTENT
  } else {
    StatusCode::SERVICE_UNAVAILABLE
  }
}

/// `GET /rofi[?index=<n>]`, only for the launcher's User-Agent.
///
/// Without an index the playlist is returned as rofi rows; with one the
/// player jumps to that entry.
pub async fn launcher(
  State(state): State<AppState>,
  headers: HeaderMap,
  Query(params): Query<IndexParams>,
) -> HttpResponse {
  let agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
  if agent != Some(&*state.launcher_agent) {
    return StatusCode::METHOD_NOT_ALLOWED.into_response();
  }

  if params.index.is_some() {
    let index = match parse_index(params.index.as_deref()) {
      Some(i) if i < state.client.playlist_len() => i,
      _ => return (StatusCode::BAD_REQUEST, "bad index").into_response(),
    };
    let result = match state.client.play_index(index).await {
      Ok(pending) => pending.wait().await,
      Err(e) => Err(e),
    };
    return match result {
      Ok(response) => {
        log::info!("Play index response: {:?}", response);
        StatusCode::OK.into_response()
      }
      Err(e) => {
        log::error!("Play index {} failed: {}", index, e);
        StatusCode::BAD_REQUEST.into_response()
      }
    };
  }

  match state.client.refresh_playlist().await {
    Ok(_) => (
      [(CONTENT_TYPE, "text/plain; charset=utf-8")],
      state.client.playlist_text(),
    )
      .into_response(),
    Err(e) => {
      log::error!("Playlist request error: {}", e);
      StatusCode::BAD_GATEWAY.into_response()
    }
  }
}
