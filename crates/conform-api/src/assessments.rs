//! Handlers for `/assessments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/assessments` | `?archived=true` for the archive list |
//! | `POST`   | `/assessments` | Body: [`NewAssessment`]; 201 + stored card |
//! | `GET`    | `/assessments/:id` | |
//! | `PATCH`  | `/assessments/:id` | Body: [`AssessmentUpdate`] |
//! | `DELETE` | `/assessments/:id` | Hard delete; cascades; elevated only |
//! | `POST`   | `/assessments/:id/archive` | Soft delete |
//! | `POST`   | `/assessments/:id/unarchive` | Back to `backlog` |
//! | `GET`    | `/assessments/:id/permissions` | Caller's [`Capabilities`] |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use conform_core::{
  access::Capabilities,
  assessment::{Assessment, AssessmentUpdate, NewAssessment},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiError, AppState, Store,
  identity::{
    self, Identity, require_author, require_elevated, require_read,
    require_write,
  },
};

/// Fetch an assessment or 404.
pub(crate) async fn fetch<S: Store>(
  state: &AppState<S>,
  id: Uuid,
) -> Result<Assessment, ApiError> {
  state
    .store
    .get_assessment(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("assessment {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If `true`, return the archived column instead of the active board.
  #[serde(default)]
  pub archived: bool,
}

/// `GET /assessments[?archived=true]` — only cards the caller can read.
pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Assessment>>, ApiError> {
  let all = state
    .store
    .list_assessments(params.archived)
    .await
    .map_err(ApiError::from_store)?;

  // Org-level readers see the whole board; everyone else only the cards
  // their ACL rows grant.
  let mut visible = Vec::with_capacity(all.len());
  for assessment in all {
    let caps = identity::capabilities(&state, &identity, assessment.id).await?;
    if caps.can_read {
      visible.push(assessment);
    }
  }
  Ok(Json(visible))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /assessments` — returns 201 + the stored card.
pub async fn create<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Json(body): Json<NewAssessment>,
) -> Result<impl IntoResponse, ApiError> {
  require_author(&state, &identity).await?;

  if body.title.trim().is_empty() {
    return Err(ApiError::BadRequest("title must not be empty".into()));
  }

  let assessment = state
    .store
    .create_assessment(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(assessment)))
}

// ─── Get / update / delete ────────────────────────────────────────────────────

/// `GET /assessments/:id`
pub async fn get_one<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Assessment>, ApiError> {
  let assessment = fetch(&state, id).await?;
  require_read(&state, &identity, id).await?;
  Ok(Json(assessment))
}

/// `PATCH /assessments/:id` — field-wise update.
pub async fn update<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<AssessmentUpdate>,
) -> Result<Json<Assessment>, ApiError> {
  require_write(&state, &identity, id).await?;
  let assessment = state
    .store
    .update_assessment(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(assessment))
}

/// `DELETE /assessments/:id` — hard delete with cascade.
pub async fn delete_one<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Assessment>, ApiError> {
  require_elevated(&state, &identity).await?;
  let assessment = state
    .store
    .delete_assessment(id)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(%id, user = %identity.user_id, "assessment hard-deleted");
  Ok(Json(assessment))
}

// ─── Archive lifecycle ────────────────────────────────────────────────────────

/// `POST /assessments/:id/archive`
pub async fn archive<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Assessment>, ApiError> {
  require_write(&state, &identity, id).await?;
  let assessment = state
    .store
    .archive_assessment(id)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(%id, user = %identity.user_id, "assessment archived");
  Ok(Json(assessment))
}

/// `POST /assessments/:id/unarchive`
pub async fn unarchive<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Assessment>, ApiError> {
  require_write(&state, &identity, id).await?;
  let assessment = state
    .store
    .unarchive_assessment(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(assessment))
}

// ─── Permissions ──────────────────────────────────────────────────────────────

/// `GET /assessments/:id/permissions` — the caller's resolved capabilities,
/// so clients can render read-only state without probing for 403s.
pub async fn permissions<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Capabilities>, ApiError> {
  fetch(&state, id).await?;
  let caps = identity::capabilities(&state, &identity, id).await?;
  Ok(Json(caps))
}
