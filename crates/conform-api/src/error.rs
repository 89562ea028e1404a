//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a store failure onto a status code via the core error taxonomy.
  pub fn from_store<E: Into<conform_core::Error>>(e: E) -> Self {
    use conform_core::Error as Core;
    match e.into() {
      e @ (Core::AssessmentNotFound(_)
      | Core::MessageNotFound(_)
      | Core::AttachmentNotFound(_)
      | Core::CollaboratorNotFound(_)) => ApiError::NotFound(e.to_string()),
      e @ (Core::UnknownParent(_) | Core::ReplyToReply(_)) => {
        ApiError::BadRequest(e.to_string())
      }
      Core::InvalidInput(m) => ApiError::BadRequest(m),
      Core::Forbidden => ApiError::Forbidden,
      Core::Conflict(m) => ApiError::Conflict(m),
      e => ApiError::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_owned()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
