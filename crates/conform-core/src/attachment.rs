//! Attachment metadata. Blob bytes live in an external store; the engine
//! manages only metadata and section linkage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
  pub id:            Uuid,
  pub assessment_id: Uuid,
  pub name:          String,
  pub created:       DateTime<Utc>,
  pub modified:      DateTime<Utc>,
  /// Size in bytes, as reported by the blob store.
  pub size:          u64,
}

/// Input to [`crate::store::AssessmentStore::add_attachment`]. Timestamps
/// are set by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttachment {
  pub name: String,
  #[serde(default)]
  pub size: u64,
}
