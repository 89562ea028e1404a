//! Handlers for the answer store.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/assessments/:id/answers` | Full map, keyed by subsection id |
//! | `PATCH` | `/assessments/:id/answers` | Merge patch; returns the merged map |

use axum::{
  Json,
  extract::{Path, State},
};
use conform_core::answer::{AnswerMap, AnswerPatch};
use uuid::Uuid;

use crate::{
  ApiError, AppState, Store,
  assessments::fetch,
  identity::{Identity, require_read, require_write},
};

/// `GET /assessments/:id/answers`
pub async fn get_all<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<AnswerMap>, ApiError> {
  fetch(&state, id).await?;
  require_read(&state, &identity, id).await?;
  let answers = state
    .store
    .get_answers(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(answers))
}

/// `PATCH /assessments/:id/answers`
///
/// The body is a partial map: object values merge field-by-field into the
/// stored subsection, `null` clears a subsection, anything else replaces it.
/// Responds with the full merged map so clients reconcile in one round trip.
pub async fn patch<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<AnswerPatch>,
) -> Result<Json<AnswerMap>, ApiError> {
  require_write(&state, &identity, id).await?;
  let merged = state
    .store
    .apply_answer_patch(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(merged))
}
