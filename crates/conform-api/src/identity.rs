//! Caller identity and per-assessment capability checks.
//!
//! The fronting auth proxy authenticates the user and forwards the result in
//! plain headers: `x-user-id` (required) and `x-org-id` (optional, selects
//! the org context for role resolution). Requests without a valid
//! `x-user-id` are rejected with 401 before any handler logic runs.

use axum::{extract::FromRequestParts, http::request::Parts};
use conform_core::access::{self, Capabilities, OrgContext, Principal};
use uuid::Uuid;

use crate::{ApiError, AppState, Store};

/// The caller, as asserted by the auth proxy.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
  pub user_id: Uuid,
  pub org:     OrgContext,
}

impl Identity {
  pub fn principal<S>(&self, state: &AppState<S>) -> Principal {
    Principal {
      user_id: self.user_id,
      admin:   state.instance_admins.contains(&self.user_id),
    }
  }
}

fn header_uuid(parts: &Parts, name: &str) -> Result<Option<Uuid>, ApiError> {
  let Some(value) = parts.headers.get(name) else {
    return Ok(None);
  };
  let text = value
    .to_str()
    .map_err(|_| ApiError::BadRequest(format!("invalid {name} header")))?;
  Uuid::parse_str(text)
    .map(Some)
    .map_err(|_| ApiError::BadRequest(format!("invalid {name} header")))
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let user_id = header_uuid(parts, "x-user-id")?
      .ok_or_else(|| ApiError::Unauthorized("missing x-user-id header".into()))?;
    let org = OrgContext { org_id: header_uuid(parts, "x-org-id")? };
    Ok(Identity { user_id, org })
  }
}

// ─── Capability checks ───────────────────────────────────────────────────────

/// Resolve the caller's capabilities for one assessment.
pub async fn capabilities<S: Store>(
  state: &AppState<S>,
  identity: &Identity,
  assessment_id: Uuid,
) -> Result<Capabilities, ApiError> {
  let memberships = state
    .store
    .memberships_for(identity.user_id)
    .await
    .map_err(ApiError::from_store)?;
  let collaborator = state
    .store
    .collaborator_role(assessment_id, identity.user_id)
    .await
    .map_err(ApiError::from_store)?;

  Ok(access::resolve_access(
    &identity.principal(state),
    identity.org,
    &memberships,
    collaborator,
  ))
}

pub async fn require_read<S: Store>(
  state: &AppState<S>,
  identity: &Identity,
  assessment_id: Uuid,
) -> Result<(), ApiError> {
  if capabilities(state, identity, assessment_id).await?.can_read {
    Ok(())
  } else {
    Err(ApiError::Forbidden)
  }
}

pub async fn require_write<S: Store>(
  state: &AppState<S>,
  identity: &Identity,
  assessment_id: Uuid,
) -> Result<(), ApiError> {
  if capabilities(state, identity, assessment_id).await?.can_write {
    Ok(())
  } else {
    Err(ApiError::Forbidden)
  }
}

/// Gate for operations with no assessment-scoped ACL, e.g. creating an
/// assessment: the org role alone must grant write.
pub async fn require_author<S: Store>(
  state: &AppState<S>,
  identity: &Identity,
) -> Result<(), ApiError> {
  let memberships = state
    .store
    .memberships_for(identity.user_id)
    .await
    .map_err(ApiError::from_store)?;
  let caps = access::resolve_access(
    &identity.principal(state),
    identity.org,
    &memberships,
    None,
  );
  if caps.can_write {
    Ok(())
  } else {
    Err(ApiError::Forbidden)
  }
}

/// Gate for collaborator management: write access on the assessment is
/// enough, so editor collaborators can share their own assessments; an
/// elevated org role works regardless of write access.
pub async fn require_write_or_elevated<S: Store>(
  state: &AppState<S>,
  identity: &Identity,
  assessment_id: Uuid,
) -> Result<(), ApiError> {
  if capabilities(state, identity, assessment_id).await?.can_write {
    return Ok(());
  }
  require_elevated(state, identity).await
}

/// Gate for destructive or ACL-managing operations: instance admin, or an
/// elevated role in the request's org context.
pub async fn require_elevated<S: Store>(
  state: &AppState<S>,
  identity: &Identity,
) -> Result<(), ApiError> {
  if identity.principal(state).admin {
    return Ok(());
  }

  let memberships = state
    .store
    .memberships_for(identity.user_id)
    .await
    .map_err(ApiError::from_store)?;

  if memberships
    .iter()
    .any(|m| m.role == conform_core::access::OrgRole::Admin)
  {
    return Ok(());
  }

  let org_id = identity
    .org
    .org_id
    .or_else(|| memberships.first().map(|m| m.org_id));
  let elevated = org_id
    .and_then(|id| memberships.iter().find(|m| m.org_id == id))
    .is_some_and(|m| m.role.is_elevated());

  if elevated { Ok(()) } else { Err(ApiError::Forbidden) }
}
