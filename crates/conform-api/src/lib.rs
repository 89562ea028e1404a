//! JSON REST API for Conform.
//!
//! Exposes an axum [`Router`] backed by any [`AssessmentStore`]. Identity
//! arrives in `x-user-id` / `x-org-id` headers set by the fronting auth
//! proxy; TLS and session handling are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", conform_api::api_router(state))
//! ```

pub mod answers;
pub mod assessments;
pub mod attachments;
pub mod collaborators;
pub mod error;
pub mod identity;
pub mod messages;
pub mod structure;

use std::{collections::HashSet, path::PathBuf, sync::Arc};

use axum::{
  Json,
  Router,
  routing::{delete, get, post},
};
use conform_core::{catalog::FrameworkCatalog, store::AssessmentStore};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

pub use error::ApiError;

/// Bound shared by every handler: a cloneable store whose error collapses
/// into the core taxonomy, so status-code mapping stays backend-agnostic.
pub trait Store:
  AssessmentStore<Error: Into<conform_core::Error>>
  + Clone
  + Send
  + Sync
  + 'static
{
}

impl<S> Store for S where
  S: AssessmentStore<Error: Into<conform_core::Error>>
    + Clone
    + Send
    + Sync
    + 'static
{
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// User ids granted the instance-wide admin capability.
  #[serde(default)]
  pub instance_admins: Vec<Uuid>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:           Arc<S>,
  pub catalog:         Arc<FrameworkCatalog>,
  pub instance_admins: Arc<HashSet<Uuid>>,
}

// Manual impl: `S` itself need not be `Clone` behind the `Arc`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:           self.store.clone(),
      catalog:         self.catalog.clone(),
      instance_admins: self.instance_admins.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: Store>(state: AppState<S>) -> Router<()> {
  Router::new()
    .route("/health", get(health))
    .route("/frameworks", get(structure::list_frameworks::<S>))
    // Assessments
    .route(
      "/assessments",
      get(assessments::list::<S>).post(assessments::create::<S>),
    )
    .route(
      "/assessments/{id}",
      get(assessments::get_one::<S>)
        .patch(assessments::update::<S>)
        .delete(assessments::delete_one::<S>),
    )
    .route("/assessments/{id}/archive", post(assessments::archive::<S>))
    .route(
      "/assessments/{id}/unarchive",
      post(assessments::unarchive::<S>),
    )
    .route(
      "/assessments/{id}/permissions",
      get(assessments::permissions::<S>),
    )
    // Structure & answers
    .route(
      "/assessments/{id}/structure",
      get(structure::get_structure::<S>).put(structure::put_structure::<S>),
    )
    .route(
      "/assessments/{id}/answers",
      get(answers::get_all::<S>).patch(answers::patch::<S>),
    )
    // Collaborators & memberships
    .route(
      "/assessments/{id}/collaborators",
      get(collaborators::list::<S>).post(collaborators::upsert::<S>),
    )
    .route(
      "/assessments/{id}/collaborators/{user_id}",
      delete(collaborators::remove::<S>),
    )
    .route("/memberships", post(collaborators::upsert_membership::<S>))
    // Messages
    .route(
      "/assessments/{id}/messages",
      get(messages::list::<S>).post(messages::post_one::<S>),
    )
    .route(
      "/assessments/{id}/messages/{message_id}",
      delete(messages::delete_one::<S>),
    )
    // Attachments & section links
    .route(
      "/assessments/{id}/attachments",
      get(attachments::list::<S>).post(attachments::create::<S>),
    )
    .route(
      "/assessments/{id}/attachments/{attachment_id}",
      delete(attachments::delete_one::<S>),
    )
    .route(
      "/assessments/{id}/sections/{subsection_id}/attachments",
      get(attachments::section_links::<S>)
        .put(attachments::update_section_links::<S>),
    )
    .with_state(state)
}

/// `GET /health` — liveness probe; no auth.
async fn health() -> Json<Value> {
  Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests;
