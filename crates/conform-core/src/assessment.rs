//! Assessment — one compliance-questionnaire project instance tracked
//! through a workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workflow column the assessment card sits in. `Archived` is the soft-delete
/// state; hard deletion cascades over all sub-entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowColumn {
  #[default]
  Backlog,
  Inprogress,
  Review,
  Finished,
  Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
  pub id:          Uuid,
  pub title:       String,
  pub column:      WorkflowColumn,
  pub due_in:      String,
  /// Framework display name; resolves a catalog template, or falls through
  /// to the built-in structure when unrecognised.
  pub framework:   String,
  pub description: String,
  pub assigned_to: String,
  pub template:    String,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::AssessmentStore::create_assessment`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewAssessment {
  pub title:       String,
  #[serde(default)]
  pub column:      WorkflowColumn,
  pub due_in:      Option<String>,
  pub framework:   Option<String>,
  pub description: Option<String>,
  pub assigned_to: Option<String>,
  pub template:    Option<String>,
}

impl NewAssessment {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title:       title.into(),
      column:      WorkflowColumn::default(),
      due_in:      None,
      framework:   None,
      description: None,
      assigned_to: None,
      template:    None,
    }
  }

  pub fn framework(mut self, name: impl Into<String>) -> Self {
    self.framework = Some(name.into());
    self
  }
}

/// Field-wise update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessmentUpdate {
  pub title:       Option<String>,
  pub column:      Option<WorkflowColumn>,
  pub due_in:      Option<String>,
  pub framework:   Option<String>,
  pub description: Option<String>,
  pub assigned_to: Option<String>,
  pub template:    Option<String>,
}
