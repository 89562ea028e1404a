//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. List fields (sections,
//! attachments, mentions) are stored as compact JSON arrays. UUIDs are stored
//! as hyphenated lowercase strings. Roles and workflow columns use the same
//! wire words as the JSON API.

use chrono::{DateTime, Utc};
use conform_core::{
  access::{Collaborator, CollaboratorRole, Membership, OrgRole},
  assessment::{Assessment, WorkflowColumn},
  attachment::Attachment,
  message::Message,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── WorkflowColumn
// ───────────────────────────────────────────────────────────

pub fn encode_column(c: WorkflowColumn) -> &'static str {
  match c {
    WorkflowColumn::Backlog => "backlog",
    WorkflowColumn::Inprogress => "inprogress",
    WorkflowColumn::Review => "review",
    WorkflowColumn::Finished => "finished",
    WorkflowColumn::Archived => "archived",
  }
}

pub fn decode_column(s: &str) -> Result<WorkflowColumn> {
  match s {
    "backlog" => Ok(WorkflowColumn::Backlog),
    "inprogress" => Ok(WorkflowColumn::Inprogress),
    "review" => Ok(WorkflowColumn::Review),
    "finished" => Ok(WorkflowColumn::Finished),
    "archived" => Ok(WorkflowColumn::Archived),
    other => Err(Error::Decode(format!("unknown workflow column: {other:?}"))),
  }
}

// ─── OrgRole ─────────────────────────────────────────────────────────────────

pub fn encode_org_role(r: OrgRole) -> &'static str {
  match r {
    OrgRole::Admin => "admin",
    OrgRole::Manager => "manager",
    OrgRole::Assessor => "assessor",
    OrgRole::Consultant => "consultant",
    OrgRole::TeamLeader => "team_leader",
    OrgRole::Qa => "qa",
    OrgRole::Viewer => "viewer",
    OrgRole::Guest => "guest",
  }
}

pub fn decode_org_role(s: &str) -> Result<OrgRole> {
  match s {
    "admin" => Ok(OrgRole::Admin),
    "manager" => Ok(OrgRole::Manager),
    "assessor" => Ok(OrgRole::Assessor),
    "consultant" => Ok(OrgRole::Consultant),
    "team_leader" => Ok(OrgRole::TeamLeader),
    "qa" => Ok(OrgRole::Qa),
    "viewer" => Ok(OrgRole::Viewer),
    "guest" => Ok(OrgRole::Guest),
    other => Err(Error::Decode(format!("unknown org role: {other:?}"))),
  }
}

// ─── CollaboratorRole
// ─────────────────────────────────────────────────────────

pub fn encode_collab_role(r: CollaboratorRole) -> &'static str {
  match r {
    CollaboratorRole::Viewer => "viewer",
    CollaboratorRole::Editor => "editor",
  }
}

pub fn decode_collab_role(s: &str) -> Result<CollaboratorRole> {
  match s {
    "viewer" => Ok(CollaboratorRole::Viewer),
    "editor" => Ok(CollaboratorRole::Editor),
    other => Err(Error::Decode(format!("unknown collaborator role: {other:?}"))),
  }
}

// ─── String and Uuid lists ───────────────────────────────────────────────────

pub fn encode_string_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_string_list(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_uuid_list(ids: &[Uuid]) -> Result<String> {
  let strings: Vec<String> = ids.iter().copied().map(encode_uuid).collect();
  Ok(serde_json::to_string(&strings)?)
}

pub fn decode_uuid_list(s: &str) -> Result<Vec<Uuid>> {
  let strings: Vec<String> = serde_json::from_str(s)?;
  strings.iter().map(|s| decode_uuid(s)).collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `assessments` row.
pub struct RawAssessment {
  pub assessment_id: String,
  pub title:         String,
  pub col:           String,
  pub due_in:        String,
  pub framework:     String,
  pub description:   String,
  pub assigned_to:   String,
  pub template:      String,
  pub created_at:    String,
}

impl RawAssessment {
  pub fn into_assessment(self) -> Result<Assessment> {
    Ok(Assessment {
      id:          decode_uuid(&self.assessment_id)?,
      title:       self.title,
      column:      decode_column(&self.col)?,
      due_in:      self.due_in,
      framework:   self.framework,
      description: self.description,
      assigned_to: self.assigned_to,
      template:    self.template,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `messages` row.
pub struct RawMessage {
  pub message_id:    String,
  pub assessment_id: String,
  pub author:        String,
  pub posted_at:     String,
  pub body:          String,
  pub parent_id:     Option<String>,
  pub sections:      String,
  pub attachments:   String,
  pub mentions:      String,
}

impl RawMessage {
  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      id:            decode_uuid(&self.message_id)?,
      assessment_id: decode_uuid(&self.assessment_id)?,
      author:        self.author,
      posted_at:     decode_dt(&self.posted_at)?,
      text:          self.body,
      parent_id:     self.parent_id.as_deref().map(decode_uuid).transpose()?,
      sections:      decode_string_list(&self.sections)?,
      attachments:   decode_uuid_list(&self.attachments)?,
      mentions:      decode_string_list(&self.mentions)?,
    })
  }
}

/// Raw strings read directly from an `attachments` row.
pub struct RawAttachment {
  pub attachment_id: String,
  pub assessment_id: String,
  pub name:          String,
  pub created:       String,
  pub modified:      String,
  pub size:          i64,
}

impl RawAttachment {
  pub fn into_attachment(self) -> Result<Attachment> {
    Ok(Attachment {
      id:            decode_uuid(&self.attachment_id)?,
      assessment_id: decode_uuid(&self.assessment_id)?,
      name:          self.name,
      created:       decode_dt(&self.created)?,
      modified:      decode_dt(&self.modified)?,
      size:          self.size.max(0) as u64,
    })
  }
}

/// Raw strings read directly from a `memberships` row.
pub struct RawMembership {
  pub user_id: String,
  pub org_id:  String,
  pub role:    String,
}

impl RawMembership {
  pub fn into_membership(self) -> Result<Membership> {
    Ok(Membership {
      user_id: decode_uuid(&self.user_id)?,
      org_id:  decode_uuid(&self.org_id)?,
      role:    decode_org_role(&self.role)?,
    })
  }
}

/// Raw strings read directly from a `collaborators` row.
pub struct RawCollaborator {
  pub user_id: String,
  pub role:    String,
}

impl RawCollaborator {
  pub fn into_collaborator(self) -> Result<Collaborator> {
    Ok(Collaborator {
      user_id: decode_uuid(&self.user_id)?,
      role:    decode_collab_role(&self.role)?,
    })
  }
}
