//! Handlers for questionnaire structure and the framework catalog.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/frameworks` | Registered template names |
//! | `GET` | `/assessments/:id/structure` | Resolved: override, template, fallback |
//! | `PUT` | `/assessments/:id/structure` | Save the per-assessment override |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use conform_core::{catalog, framework::Structure};
use uuid::Uuid;

use crate::{
  ApiError, AppState, Store,
  assessments::fetch,
  identity::{Identity, require_read, require_write},
};

/// `GET /frameworks`
pub async fn list_frameworks<S: Store>(
  State(state): State<AppState<S>>,
  _identity: Identity,
) -> Json<Vec<String>> {
  let mut names: Vec<String> =
    state.catalog.names().map(str::to_owned).collect();
  names.sort();
  Json(names)
}

/// `GET /assessments/:id/structure` — never 404s on an unknown framework
/// name; resolution falls through to the built-in shape.
pub async fn get_structure<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Structure>, ApiError> {
  let assessment = fetch(&state, id).await?;
  require_read(&state, &identity, id).await?;

  let override_structure = state
    .store
    .get_structure_override(id)
    .await
    .map_err(ApiError::from_store)?;

  Ok(Json(catalog::resolve_structure(
    override_structure,
    Some(&assessment.framework),
    &state.catalog,
  )))
}

/// `PUT /assessments/:id/structure` — saves the override that shadows the
/// framework template from then on.
pub async fn put_structure<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<Structure>,
) -> Result<StatusCode, ApiError> {
  require_write(&state, &identity, id).await?;
  state
    .store
    .set_structure_override(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
