//! Handlers for threaded messages.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/assessments/:id/messages` | `?threaded=true` groups replies |
//! | `POST`   | `/assessments/:id/messages` | 201; tags extracted from text |
//! | `DELETE` | `/assessments/:id/messages/:message_id` | Roots cascade replies |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use conform_core::message::{self, Message, NewMessage};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiError, AppState, Store,
  assessments::fetch,
  identity::{Identity, require_read, require_write},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If `true`, return `[{root, replies}]` instead of the flat list.
  #[serde(default)]
  pub threaded: bool,
}

/// `GET /assessments/:id/messages[?threaded=true]`
pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
  fetch(&state, id).await?;
  require_read(&state, &identity, id).await?;

  let messages = state
    .store
    .list_messages(id)
    .await
    .map_err(ApiError::from_store)?;

  if params.threaded {
    Ok(Json(message::thread(messages)).into_response())
  } else {
    Ok(Json(messages).into_response())
  }
}

/// `POST /assessments/:id/messages` — returns 201 + the stored message,
/// including section tags and mentions extracted from the text.
pub async fn post_one<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<NewMessage>,
) -> Result<impl IntoResponse, ApiError> {
  require_write(&state, &identity, id).await?;

  if body.text.trim().is_empty() {
    return Err(ApiError::BadRequest("message text must not be empty".into()));
  }

  let message = state
    .store
    .post_message(id, body.with_extracted_tags())
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(message)))
}

/// `DELETE /assessments/:id/messages/:message_id` — returns the deleted
/// message.
pub async fn delete_one<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path((id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Message>, ApiError> {
  require_write(&state, &identity, id).await?;
  let message = state
    .store
    .delete_message(id, message_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(message))
}
