//! Handlers for collaborator ACL rows and org memberships.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/assessments/:id/collaborators` | |
//! | `POST`   | `/assessments/:id/collaborators` | Upsert by user; write access or elevated |
//! | `DELETE` | `/assessments/:id/collaborators/:user_id` | Write access or elevated |
//! | `POST`   | `/memberships` | Upsert by (user, org); admin of that org |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use conform_core::access::{Collaborator, CollaboratorRole, Membership, OrgRole};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiError, AppState, Store,
  assessments::fetch,
  identity::{Identity, require_read, require_write_or_elevated},
};

/// `GET /assessments/:id/collaborators`
pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Collaborator>>, ApiError> {
  fetch(&state, id).await?;
  require_read(&state, &identity, id).await?;
  let rows = state
    .store
    .collaborators_for(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct UpsertBody {
  pub user_id: Uuid,
  pub role:    CollaboratorRole,
}

/// `POST /assessments/:id/collaborators` — returns the full list afterwards.
pub async fn upsert<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<UpsertBody>,
) -> Result<Json<Vec<Collaborator>>, ApiError> {
  require_write_or_elevated(&state, &identity, id).await?;
  let rows = state
    .store
    .upsert_collaborator(id, body.user_id, body.role)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(
    assessment = %id,
    user = %body.user_id,
    role = ?body.role,
    by = %identity.user_id,
    "collaborator upserted"
  );
  Ok(Json(rows))
}

/// `DELETE /assessments/:id/collaborators/:user_id`
pub async fn remove<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  require_write_or_elevated(&state, &identity, id).await?;
  state
    .store
    .remove_collaborator(id, user_id)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(
    assessment = %id,
    user = %user_id,
    by = %identity.user_id,
    "collaborator removed"
  );
  Ok(StatusCode::NO_CONTENT)
}

// ─── Memberships ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MembershipBody {
  pub user_id: Uuid,
  pub org_id:  Uuid,
  pub role:    OrgRole,
}

/// `POST /memberships` — instance admins, or an admin of the target org.
pub async fn upsert_membership<S: Store>(
  State(state): State<AppState<S>>,
  identity: Identity,
  Json(body): Json<MembershipBody>,
) -> Result<Json<Membership>, ApiError> {
  if !identity.principal(&state).admin {
    let memberships = state
      .store
      .memberships_for(identity.user_id)
      .await
      .map_err(ApiError::from_store)?;
    let is_org_admin = memberships
      .iter()
      .any(|m| m.org_id == body.org_id && m.role == OrgRole::Admin);
    if !is_org_admin {
      return Err(ApiError::Forbidden);
    }
  }

  let membership = state
    .store
    .upsert_membership(body.user_id, body.org_id, body.role)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(
    user = %body.user_id,
    org = %body.org_id,
    role = ?body.role,
    by = %identity.user_id,
    "membership upserted"
  );
  Ok(Json(membership))
}
