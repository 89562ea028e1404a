//! Handlers for attachment metadata and section-attachment links.
//!
//! Blob bytes never pass through this API; clients upload to the external
//! store and register the metadata here.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/assessments/:id/attachments` | |
//! | `POST`   | `/assessments/:id/attachments` | 201 + metadata row |
//! | `DELETE` | `/assessments/:id/attachments/:attachment_id` | Unlinks everywhere |
//! | `GET`    | `/assessments/:id/sections/:subsection_id/attachments` | Linked ids |
//! | `PUT`    | `/assessments/:id/sections/:subsection_id/attachments` | `{add, remove}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use conform_core::attachment::{Attachment, NewAttachment};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiError, AppState, Store,
  assessments::fetch,
  identity::{Identity, require_read, require_write},
};

/// `GET /assessments/:id/attachments`
pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Attachment>>, ApiError> {
  fetch(&state, id).await?;
  require_read(&state, &identity, id).await?;
  let rows = state
    .store
    .list_attachments(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

/// `POST /assessments/:id/attachments` — returns 201 + the metadata row.
pub async fn create<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<NewAttachment>,
) -> Result<impl IntoResponse, ApiError> {
  require_write(&state, &identity, id).await?;

  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("attachment name must not be empty".into()));
  }

  let attachment = state
    .store
    .add_attachment(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(attachment)))
}

/// `DELETE /assessments/:id/attachments/:attachment_id` — returns the
/// deleted row; every section link to it is removed as well.
pub async fn delete_one<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Attachment>, ApiError> {
  require_write(&state, &identity, id).await?;
  let attachment = state
    .store
    .delete_attachment(id, attachment_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(attachment))
}

// ─── Section links ────────────────────────────────────────────────────────────

/// `GET /assessments/:id/sections/:subsection_id/attachments`
pub async fn section_links<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path((id, subsection_id)): Path<(Uuid, String)>,
) -> Result<Json<Vec<Uuid>>, ApiError> {
  fetch(&state, id).await?;
  require_read(&state, &identity, id).await?;
  let linked = state
    .store
    .section_attachments(id, &subsection_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(linked))
}

#[derive(Debug, Deserialize)]
pub struct LinkUpdateBody {
  #[serde(default)]
  pub add:    Vec<Uuid>,
  #[serde(default)]
  pub remove: Vec<Uuid>,
}

/// `PUT /assessments/:id/sections/:subsection_id/attachments`
///
/// Applies `add` then `remove` atomically and returns the linked ids. Ids
/// unknown to the assessment are skipped silently.
pub async fn update_section_links<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path((id, subsection_id)): Path<(Uuid, String)>,
  Json(body): Json<LinkUpdateBody>,
) -> Result<Json<Vec<Uuid>>, ApiError> {
  require_write(&state, &identity, id).await?;
  let linked = state
    .store
    .update_section_attachments(id, &subsection_id, body.add, body.remove)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(linked))
}
