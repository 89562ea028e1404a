//! Error type for `conform-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] conform_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column value failed to decode (timestamp, role, column name).
  #[error("decode error: {0}")]
  Decode(String),

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

  #[error("message {0} is a reply and cannot be replied to")]
  ReplyToReply(Uuid),
}

impl Error {
  /// Whether this error maps to a missing referenced entity.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::AssessmentNotFound(_)
        | Self::MessageNotFound(_)
        | Self::AttachmentNotFound(_)
        | Self::CollaboratorNotFound(_)
    )
  }
}

/// Collapse into the core taxonomy so the API layer can map status codes
/// without depending on this crate.
impl From<Error> for conform_core::Error {
  fn from(e: Error) -> Self {
    use conform_core::Error as Core;
    match e {
      Error::Core(inner) => inner,
      Error::AssessmentNotFound(id) => Core::AssessmentNotFound(id),
      Error::MessageNotFound(id) => Core::MessageNotFound(id),
      Error::AttachmentNotFound(id) => Core::AttachmentNotFound(id),
      Error::CollaboratorNotFound(id) => Core::CollaboratorNotFound(id),
      Error::UnknownParent(id) => Core::UnknownParent(id),
      Error::ReplyToReply(id) => Core::ReplyToReply(id),
      Error::Sqlite(rusqlite::Error::SqliteFailure(code, _))
        if code.code == rusqlite::ErrorCode::DatabaseBusy =>
      {
        Core::Conflict("database busy".to_owned())
      }
      other => Core::Storage(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
