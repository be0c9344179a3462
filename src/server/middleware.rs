//! Request id and access log middleware.

use axum::extract::Request;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Request id attached to every request by [`request_id`].
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Reject non-GET requests, assign a request id and set the common
/// response headers.
pub async fn request_id(mut req: Request, next: Next) -> Response {
  if req.method() != Method::GET {
    return StatusCode::METHOD_NOT_ALLOWED.into_response();
  }

  let id = req
    .headers()
    .get(&REQUEST_ID_HEADER)
    .and_then(|v| v.to_str().ok())
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
  req.extensions_mut().insert(RequestId(id.clone()));

  let mut response = next.run(req).await;
  let headers = response.headers_mut();
  if let Ok(value) = HeaderValue::from_str(&id) {
    headers.insert(REQUEST_ID_HEADER, value);
  }
  headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
  if !headers.contains_key(CONTENT_TYPE) {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
  }
  response
}

/// Log `METHOD URI REQUEST_ID` once the request has been handled.
pub async fn access_log(req: Request, next: Next) -> Response {
  let Some(RequestId(id)) = req.extensions().get::<RequestId>().cloned() else {
    log::warn!("Unknown request id: {} {}", req.method(), req.uri());
    return StatusCode::BAD_REQUEST.into_response();
  };
  let method = req.method().clone();
  let uri = req.uri().clone();

  let response = next.run(req).await;
  log::info!("{} {} {}", method, uri, id);
  response
}
