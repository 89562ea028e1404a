//! Per-assessment access resolution.
//!
//! Two layers feed the decision: org-wide RBAC (memberships) and the
//! assessment-scoped collaborator ACL. The org role, when one resolves for
//! the request's org context, decides alone; the ACL is consulted only when
//! no role resolves, with `guest` (which grants nothing by itself) treated
//! the same as no membership. A caller with neither gets nothing; there is
//! no implicit viewer default.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Identity ────────────────────────────────────────────────────────────────

/// The authenticated caller, as resolved by the external auth layer.
///
/// `admin` is an instance-wide capability flag; it replaces the legacy
/// hardcoded-admin-identity check and short-circuits all other resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
  pub user_id: Uuid,
  pub admin:   bool,
}

/// The org the request is acting within: an explicit org id from the request,
/// else the caller's first membership.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrgContext {
  pub org_id: Option<Uuid>,
}

impl OrgContext {
  pub fn explicit(org_id: Uuid) -> Self {
    Self { org_id: Some(org_id) }
  }
}

// ─── Roles ───────────────────────────────────────────────────────────────────

/// Org-wide RBAC role carried by a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
  Admin,
  Manager,
  Assessor,
  Consultant,
  TeamLeader,
  Qa,
  Viewer,
  Guest,
}

impl OrgRole {
  pub fn can_read_assessments(self) -> bool {
    !matches!(self, Self::Guest)
  }

  /// Every write-capable role is also read-capable.
  pub fn can_write_assessments(self) -> bool {
    matches!(
      self,
      Self::Admin
        | Self::Manager
        | Self::Assessor
        | Self::Consultant
        | Self::TeamLeader
    )
  }

  /// Roles allowed to manage collaborators and memberships.
  pub fn is_elevated(self) -> bool {
    matches!(self, Self::Admin | Self::Manager | Self::TeamLeader)
  }
}

/// Assessment-scoped ACL role, layered atop org RBAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorRole {
  Viewer,
  Editor,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// Org-wide membership row, unique per (user, org).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
  pub user_id: Uuid,
  pub org_id:  Uuid,
  pub role:    OrgRole,
}

/// Assessment-scoped ACL row, upserted by (assessment, user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaborator {
  pub user_id: Uuid,
  pub role:    CollaboratorRole,
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// What the caller may do with one assessment. Read and write are evaluated
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
  pub can_read:  bool,
  pub can_write: bool,
}

impl Capabilities {
  pub const ALL: Self = Self { can_read: true, can_write: true };
  pub const NONE: Self = Self { can_read: false, can_write: false };
  pub const READ_ONLY: Self = Self { can_read: true, can_write: false };
}

/// Resolve the caller's capabilities for one assessment.
///
/// 1. Admin capability or an `admin` role in any org short-circuits to full
///    access.
/// 2. Otherwise the org role for the request's org context (explicit org id,
///    else first membership) decides. A resolved `guest` role grants nothing
///    by itself, so it falls through like a missing membership.
/// 3. Only when no role resolves does the collaborator ACL apply: any row
///    grants read, an editor row grants write.
pub fn resolve_access(
  principal: &Principal,
  org: OrgContext,
  memberships: &[Membership],
  collaborator: Option<CollaboratorRole>,
) -> Capabilities {
  if principal.admin
    || memberships.iter().any(|m| m.role == OrgRole::Admin)
  {
    return Capabilities::ALL;
  }

  let org_id = org.org_id.or_else(|| memberships.first().map(|m| m.org_id));
  let role = org_id
    .and_then(|id| memberships.iter().find(|m| m.org_id == id))
    .map(|m| m.role);

  match role {
    Some(role) if role != OrgRole::Guest => Capabilities {
      can_read:  role.can_read_assessments(),
      can_write: role.can_write_assessments(),
    },
    _ => match collaborator {
      Some(CollaboratorRole::Editor) => Capabilities::ALL,
      Some(CollaboratorRole::Viewer) => Capabilities::READ_ONLY,
      None => Capabilities::NONE,
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user() -> Principal {
    Principal { user_id: Uuid::new_v4(), admin: false }
  }

  fn membership(user: &Principal, org_id: Uuid, role: OrgRole) -> Membership {
    Membership { user_id: user.user_id, org_id, role }
  }

  #[test]
  fn admin_flag_overrides_everything() {
    let p = Principal { user_id: Uuid::new_v4(), admin: true };
    let caps = resolve_access(&p, OrgContext::default(), &[], None);
    assert_eq!(caps, Capabilities::ALL);
  }

  #[test]
  fn admin_org_role_in_any_org_overrides() {
    let p = user();
    let other_org = Uuid::new_v4();
    let ms = [membership(&p, other_org, OrgRole::Admin)];
    // Org context points elsewhere; the admin role still short-circuits.
    let caps =
      resolve_access(&p, OrgContext::explicit(Uuid::new_v4()), &ms, None);
    assert_eq!(caps, Capabilities::ALL);
  }

  #[test]
  fn viewer_role_reads_but_never_writes() {
    let p = user();
    let org = Uuid::new_v4();
    let ms = [membership(&p, org, OrgRole::Viewer)];

    let caps = resolve_access(&p, OrgContext::explicit(org), &ms, None);
    assert_eq!(caps, Capabilities::READ_ONLY);

    // An editor ACL row does not upgrade a resolved org role.
    let caps = resolve_access(
      &p,
      OrgContext::explicit(org),
      &ms,
      Some(CollaboratorRole::Editor),
    );
    assert_eq!(caps, Capabilities::READ_ONLY);
  }

  #[test]
  fn guest_falls_through_to_the_acl() {
    let p = user();
    let org = Uuid::new_v4();
    let ms = [membership(&p, org, OrgRole::Guest)];

    // A guest membership alone grants nothing.
    let caps = resolve_access(&p, OrgContext::explicit(org), &ms, None);
    assert_eq!(caps, Capabilities::NONE);

    // But it does not block an ACL row the way a viewer role would.
    let caps = resolve_access(
      &p,
      OrgContext::explicit(org),
      &ms,
      Some(CollaboratorRole::Editor),
    );
    assert_eq!(caps, Capabilities::ALL);
  }

  #[test]
  fn qa_is_read_only_and_assessor_writes() {
    let p = user();
    let org = Uuid::new_v4();

    let qa = [membership(&p, org, OrgRole::Qa)];
    assert_eq!(
      resolve_access(&p, OrgContext::explicit(org), &qa, None),
      Capabilities::READ_ONLY
    );

    let assessor = [membership(&p, org, OrgRole::Assessor)];
    assert_eq!(
      resolve_access(&p, OrgContext::explicit(org), &assessor, None),
      Capabilities::ALL
    );
  }

  #[test]
  fn first_membership_is_the_default_org_context() {
    let p = user();
    let ms = [
      membership(&p, Uuid::new_v4(), OrgRole::Manager),
      membership(&p, Uuid::new_v4(), OrgRole::Guest),
    ];
    let caps = resolve_access(&p, OrgContext::default(), &ms, None);
    assert_eq!(caps, Capabilities::ALL);
  }

  #[test]
  fn editor_collaborator_grants_both_without_membership() {
    let p = user();
    let caps = resolve_access(
      &p,
      OrgContext::default(),
      &[],
      Some(CollaboratorRole::Editor),
    );
    assert_eq!(caps, Capabilities::ALL);
  }

  #[test]
  fn viewer_collaborator_grants_read_only() {
    let p = user();
    let caps = resolve_access(
      &p,
      OrgContext::default(),
      &[],
      Some(CollaboratorRole::Viewer),
    );
    assert_eq!(caps, Capabilities::READ_ONLY);
  }

  #[test]
  fn nothing_resolves_to_nothing() {
    // Never default to viewer.
    let caps = resolve_access(&user(), OrgContext::default(), &[], None);
    assert_eq!(caps, Capabilities::NONE);
  }

  #[test]
  fn every_write_capable_role_is_read_capable() {
    for role in [
      OrgRole::Admin,
      OrgRole::Manager,
      OrgRole::Assessor,
      OrgRole::Consultant,
      OrgRole::TeamLeader,
      OrgRole::Qa,
      OrgRole::Viewer,
      OrgRole::Guest,
    ] {
      if role.can_write_assessments() {
        assert!(role.can_read_assessments(), "{role:?}");
      }
    }
  }
}
