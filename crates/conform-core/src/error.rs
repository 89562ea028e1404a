//! Error types for `conform-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("assessment not found: {0}")]
  AssessmentNotFound(Uuid),

  #[error("message not found: {0}")]
  MessageNotFound(Uuid),

  #[error("attachment not found: {0}")]
  AttachmentNotFound(Uuid),

  #[error("collaborator not found: {0}")]
  CollaboratorNotFound(Uuid),

  #[error("parent message not found in this assessment: {0}")]
  UnknownParent(Uuid),

  /// Reply depth is capped at one level; a reply cannot itself be a parent.
  #[error("message {0} is a reply and cannot be replied to")]
  ReplyToReply(Uuid),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("forbidden")]
  Forbidden,

  /// Reserved for lock/busy timeouts surfaced by the backing store.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// An opaque backend failure, carried up for the API layer to report.
  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
