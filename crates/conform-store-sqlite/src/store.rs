//! [`SqliteStore`] — the SQLite implementation of [`AssessmentStore`].
//!
//! Mutations run their full read-modify-write inside one transaction on the
//! connection's worker thread, so two requests racing on the same assessment
//! serialise instead of interleaving mid-merge. Transactional bodies live in
//! free `*_tx` functions returning `Result<T, Error>`; the `call` closure
//! commits only when the body succeeded.

use std::path::Path;

use chrono::Utc;
use conform_core::{
  access::{Collaborator, CollaboratorRole, Membership, OrgRole},
  answer::{merge_value, AnswerMap, AnswerPatch},
  assessment::{Assessment, AssessmentUpdate, NewAssessment, WorkflowColumn},
  attachment::{Attachment, NewAttachment},
  framework::Structure,
  message::{Message, NewMessage},
  store::AssessmentStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  encode::{
    decode_collab_role, encode_collab_role, encode_column, encode_dt,
    encode_org_role, encode_string_list, encode_uuid, encode_uuid_list,
    RawAssessment, RawAttachment, RawCollaborator, RawMembership, RawMessage,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Conform assessment store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let version: i64 =
          conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version < 1 {
          conn.execute_batch(SCHEMA)?;
        }
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `body` inside a transaction on the connection thread; commit only on
  /// success.
  async fn transact<T, F>(&self, body: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Transaction) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = body(&tx);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }
}

// ─── Transaction bodies ──────────────────────────────────────────────────────

const ASSESSMENT_COLUMNS: &str =
  "assessment_id, title, col, due_in, framework, description, assigned_to, \
   template, created_at";

fn read_assessment_row(row: &rusqlite::Row) -> rusqlite::Result<RawAssessment> {
  Ok(RawAssessment {
    assessment_id: row.get(0)?,
    title:         row.get(1)?,
    col:           row.get(2)?,
    due_in:        row.get(3)?,
    framework:     row.get(4)?,
    description:   row.get(5)?,
    assigned_to:   row.get(6)?,
    template:      row.get(7)?,
    created_at:    row.get(8)?,
  })
}

fn select_assessment(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> Result<Option<RawAssessment>> {
  let sql =
    format!("SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE assessment_id = ?1");
  Ok(
    conn
      .query_row(&sql, rusqlite::params![id_str], read_assessment_row)
      .optional()?,
  )
}

/// Fetch an assessment or fail with `AssessmentNotFound`.
fn require_assessment(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> Result<Assessment> {
  select_assessment(conn, &encode_uuid(id))?
    .ok_or(Error::AssessmentNotFound(id))?
    .into_assessment()
}

fn write_assessment(
  conn: &rusqlite::Connection,
  assessment: &Assessment,
) -> Result<()> {
  conn.execute(
    "INSERT OR REPLACE INTO assessments (
       assessment_id, title, col, due_in, framework,
       description, assigned_to, template, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    rusqlite::params![
      encode_uuid(assessment.id),
      assessment.title,
      encode_column(assessment.column),
      assessment.due_in,
      assessment.framework,
      assessment.description,
      assessment.assigned_to,
      assessment.template,
      encode_dt(assessment.created_at),
    ],
  )?;
  Ok(())
}

fn update_assessment_tx(
  tx: &rusqlite::Transaction,
  id: Uuid,
  update: AssessmentUpdate,
) -> Result<Assessment> {
  let mut assessment = require_assessment(tx, id)?;

  if let Some(title) = update.title {
    assessment.title = title;
  }
  if let Some(column) = update.column {
    assessment.column = column;
  }
  if let Some(due_in) = update.due_in {
    assessment.due_in = due_in;
  }
  if let Some(framework) = update.framework {
    assessment.framework = framework;
  }
  if let Some(description) = update.description {
    assessment.description = description;
  }
  if let Some(assigned_to) = update.assigned_to {
    assessment.assigned_to = assigned_to;
  }
  if let Some(template) = update.template {
    assessment.template = template;
  }

  write_assessment(tx, &assessment)?;
  Ok(assessment)
}

fn set_column_tx(
  tx: &rusqlite::Transaction,
  id: Uuid,
  column: WorkflowColumn,
) -> Result<Assessment> {
  let mut assessment = require_assessment(tx, id)?;
  assessment.column = column;
  write_assessment(tx, &assessment)?;
  Ok(assessment)
}

fn delete_assessment_tx(
  tx: &rusqlite::Transaction,
  id: Uuid,
) -> Result<Assessment> {
  let assessment = require_assessment(tx, id)?;
  let id_str = encode_uuid(id);

  for table in [
    "section_links",
    "attachments",
    "messages",
    "collaborators",
    "answers",
    "structure_overrides",
    "assessments",
  ] {
    tx.execute(
      &format!("DELETE FROM {table} WHERE assessment_id = ?1"),
      rusqlite::params![id_str],
    )?;
  }

  Ok(assessment)
}

fn apply_answer_patch_tx(
  tx: &rusqlite::Transaction,
  assessment_id: Uuid,
  patch: AnswerPatch,
) -> Result<AnswerMap> {
  require_assessment(tx, assessment_id)?;
  let id_str = encode_uuid(assessment_id);

  for (subsection_id, incoming) in patch {
    let existing_json: Option<String> = tx
      .query_row(
        "SELECT value_json FROM answers
         WHERE assessment_id = ?1 AND subsection_id = ?2",
        rusqlite::params![id_str, subsection_id],
        |r| r.get(0),
      )
      .optional()?;

    let existing = existing_json
      .as_deref()
      .map(serde_json::from_str)
      .transpose()?;

    match merge_value(existing, incoming) {
      Some(merged) => {
        tx.execute(
          "INSERT OR REPLACE INTO answers (assessment_id, subsection_id, value_json)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, subsection_id, serde_json::to_string(&merged)?],
        )?;
      }
      None => {
        tx.execute(
          "DELETE FROM answers WHERE assessment_id = ?1 AND subsection_id = ?2",
          rusqlite::params![id_str, subsection_id],
        )?;
      }
    }
  }

  read_answers(tx, &id_str)
}

fn read_answers(conn: &rusqlite::Connection, id_str: &str) -> Result<AnswerMap> {
  let mut stmt = conn.prepare(
    "SELECT subsection_id, value_json FROM answers WHERE assessment_id = ?1",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![id_str], |row| {
      Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut answers = AnswerMap::new();
  for (subsection_id, value_json) in rows {
    answers.insert(subsection_id, serde_json::from_str(&value_json)?);
  }
  Ok(answers)
}

const MESSAGE_COLUMNS: &str =
  "message_id, assessment_id, author, posted_at, body, parent_id, sections, \
   attachments, mentions";

fn read_message_row(row: &rusqlite::Row) -> rusqlite::Result<RawMessage> {
  Ok(RawMessage {
    message_id:    row.get(0)?,
    assessment_id: row.get(1)?,
    author:        row.get(2)?,
    posted_at:     row.get(3)?,
    body:          row.get(4)?,
    parent_id:     row.get(5)?,
    sections:      row.get(6)?,
    attachments:   row.get(7)?,
    mentions:      row.get(8)?,
  })
}

fn post_message_tx(
  tx: &rusqlite::Transaction,
  assessment_id: Uuid,
  input: NewMessage,
) -> Result<Message> {
  require_assessment(tx, assessment_id)?;
  let id_str = encode_uuid(assessment_id);

  if let Some(parent_id) = input.parent_id {
    let parent_of_parent: Option<Option<String>> = tx
      .query_row(
        "SELECT parent_id FROM messages
         WHERE message_id = ?1 AND assessment_id = ?2",
        rusqlite::params![encode_uuid(parent_id), id_str],
        |r| r.get(0),
      )
      .optional()?;

    match parent_of_parent {
      None => return Err(Error::UnknownParent(parent_id)),
      Some(Some(_)) => return Err(Error::ReplyToReply(parent_id)),
      Some(None) => {}
    }
  }

  let message = Message {
    id: Uuid::new_v4(),
    assessment_id,
    author: input.author,
    posted_at: Utc::now(),
    text: input.text,
    parent_id: input.parent_id,
    sections: input.sections,
    attachments: input.attachments,
    mentions: input.mentions,
  };

  tx.execute(
    "INSERT INTO messages (
       message_id, assessment_id, author, posted_at, body,
       parent_id, sections, attachments, mentions
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    rusqlite::params![
      encode_uuid(message.id),
      id_str,
      message.author,
      encode_dt(message.posted_at),
      message.text,
      message.parent_id.map(encode_uuid),
      encode_string_list(&message.sections)?,
      encode_uuid_list(&message.attachments)?,
      encode_string_list(&message.mentions)?,
    ],
  )?;

  Ok(message)
}

fn delete_message_tx(
  tx: &rusqlite::Transaction,
  assessment_id: Uuid,
  message_id: Uuid,
) -> Result<Message> {
  let sql = format!(
    "SELECT {MESSAGE_COLUMNS} FROM messages
     WHERE message_id = ?1 AND assessment_id = ?2"
  );
  let raw: Option<RawMessage> = tx
    .query_row(
      &sql,
      rusqlite::params![encode_uuid(message_id), encode_uuid(assessment_id)],
      read_message_row,
    )
    .optional()?;

  let message = raw
    .ok_or(Error::MessageNotFound(message_id))?
    .into_message()?;

  if message.parent_id.is_none() {
    tx.execute(
      "DELETE FROM messages WHERE parent_id = ?1",
      rusqlite::params![encode_uuid(message_id)],
    )?;
  }
  tx.execute(
    "DELETE FROM messages WHERE message_id = ?1",
    rusqlite::params![encode_uuid(message_id)],
  )?;

  Ok(message)
}

const ATTACHMENT_COLUMNS: &str =
  "attachment_id, assessment_id, name, created, modified, size";

fn read_attachment_row(row: &rusqlite::Row) -> rusqlite::Result<RawAttachment> {
  Ok(RawAttachment {
    attachment_id: row.get(0)?,
    assessment_id: row.get(1)?,
    name:          row.get(2)?,
    created:       row.get(3)?,
    modified:      row.get(4)?,
    size:          row.get(5)?,
  })
}

fn delete_attachment_tx(
  tx: &rusqlite::Transaction,
  assessment_id: Uuid,
  attachment_id: Uuid,
) -> Result<Attachment> {
  let sql = format!(
    "SELECT {ATTACHMENT_COLUMNS} FROM attachments
     WHERE attachment_id = ?1 AND assessment_id = ?2"
  );
  let raw: Option<RawAttachment> = tx
    .query_row(
      &sql,
      rusqlite::params![encode_uuid(attachment_id), encode_uuid(assessment_id)],
      read_attachment_row,
    )
    .optional()?;

  let attachment = raw
    .ok_or(Error::AttachmentNotFound(attachment_id))?
    .into_attachment()?;

  // Unlink everywhere before removing the row itself.
  tx.execute(
    "DELETE FROM section_links WHERE assessment_id = ?1 AND attachment_id = ?2",
    rusqlite::params![encode_uuid(assessment_id), encode_uuid(attachment_id)],
  )?;
  tx.execute(
    "DELETE FROM attachments WHERE attachment_id = ?1",
    rusqlite::params![encode_uuid(attachment_id)],
  )?;

  Ok(attachment)
}

fn read_section_links(
  conn: &rusqlite::Connection,
  assessment_id_str: &str,
  subsection_id: &str,
) -> Result<Vec<Uuid>> {
  let mut stmt = conn.prepare(
    "SELECT attachment_id FROM section_links
     WHERE assessment_id = ?1 AND subsection_id = ?2
     ORDER BY rowid",
  )?;
  let ids = stmt
    .query_map(rusqlite::params![assessment_id_str, subsection_id], |row| {
      row.get::<_, String>(0)
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  ids
    .iter()
    .map(|s| crate::encode::decode_uuid(s))
    .collect()
}

fn update_section_links_tx(
  tx: &rusqlite::Transaction,
  assessment_id: Uuid,
  subsection_id: &str,
  add: Vec<Uuid>,
  remove: Vec<Uuid>,
) -> Result<Vec<Uuid>> {
  require_assessment(tx, assessment_id)?;
  let id_str = encode_uuid(assessment_id);

  // Silently skip ids that are not attachments of this assessment.
  for attachment_id in add {
    tx.execute(
      "INSERT OR IGNORE INTO section_links (assessment_id, subsection_id, attachment_id)
       SELECT ?1, ?2, ?3
       WHERE EXISTS (
         SELECT 1 FROM attachments
         WHERE attachment_id = ?3 AND assessment_id = ?1
       )",
      rusqlite::params![id_str, subsection_id, encode_uuid(attachment_id)],
    )?;
  }
  for attachment_id in remove {
    tx.execute(
      "DELETE FROM section_links
       WHERE assessment_id = ?1 AND subsection_id = ?2 AND attachment_id = ?3",
      rusqlite::params![id_str, subsection_id, encode_uuid(attachment_id)],
    )?;
  }

  read_section_links(tx, &id_str, subsection_id)
}

fn upsert_collaborator_tx(
  tx: &rusqlite::Transaction,
  assessment_id: Uuid,
  user_id: Uuid,
  role: CollaboratorRole,
) -> Result<Vec<Collaborator>> {
  require_assessment(tx, assessment_id)?;
  let id_str = encode_uuid(assessment_id);

  tx.execute(
    "INSERT INTO collaborators (assessment_id, user_id, role)
     VALUES (?1, ?2, ?3)
     ON CONFLICT (assessment_id, user_id) DO UPDATE SET role = excluded.role",
    rusqlite::params![id_str, encode_uuid(user_id), encode_collab_role(role)],
  )?;

  read_collaborators(tx, &id_str)
}

fn read_collaborators(
  conn: &rusqlite::Connection,
  assessment_id_str: &str,
) -> Result<Vec<Collaborator>> {
  let mut stmt = conn.prepare(
    "SELECT user_id, role FROM collaborators
     WHERE assessment_id = ?1
     ORDER BY rowid",
  )?;
  let raws = stmt
    .query_map(rusqlite::params![assessment_id_str], |row| {
      Ok(RawCollaborator { user_id: row.get(0)?, role: row.get(1)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(RawCollaborator::into_collaborator)
    .collect()
}

// ─── AssessmentStore impl ────────────────────────────────────────────────────

impl AssessmentStore for SqliteStore {
  type Error = Error;

  // ── Assessments ───────────────────────────────────────────────────────────

  async fn create_assessment(&self, input: NewAssessment) -> Result<Assessment> {
    let assessment = Assessment {
      id:          Uuid::new_v4(),
      title:       input.title,
      column:      input.column,
      due_in:      input.due_in.unwrap_or_else(|| "30 days".to_owned()),
      framework:   input.framework.unwrap_or_else(|| "Custom".to_owned()),
      description: input.description.unwrap_or_default(),
      assigned_to: input.assigned_to.unwrap_or_default(),
      template:    input.template.unwrap_or_default(),
      created_at:  Utc::now(),
    };

    let row = assessment.clone();
    self
      .transact(move |tx| write_assessment(tx, &row))
      .await?;

    Ok(assessment)
  }

  async fn get_assessment(&self, id: Uuid) -> Result<Option<Assessment>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAssessment> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE assessment_id = ?1"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], read_assessment_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAssessment::into_assessment).transpose()
  }

  async fn list_assessments(&self, archived_only: bool) -> Result<Vec<Assessment>> {
    let raws: Vec<RawAssessment> = self
      .conn
      .call(move |conn| {
        let filter = if archived_only {
          "WHERE col = 'archived'"
        } else {
          "WHERE col != 'archived'"
        };
        let sql = format!(
          "SELECT {ASSESSMENT_COLUMNS} FROM assessments {filter}
           ORDER BY created_at DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], read_assessment_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAssessment::into_assessment).collect()
  }

  async fn update_assessment(
    &self,
    id: Uuid,
    update: AssessmentUpdate,
  ) -> Result<Assessment> {
    self
      .transact(move |tx| update_assessment_tx(tx, id, update))
      .await
  }

  async fn archive_assessment(&self, id: Uuid) -> Result<Assessment> {
    self
      .transact(move |tx| set_column_tx(tx, id, WorkflowColumn::Archived))
      .await
  }

  async fn unarchive_assessment(&self, id: Uuid) -> Result<Assessment> {
    self
      .transact(move |tx| set_column_tx(tx, id, WorkflowColumn::Backlog))
      .await
  }

  async fn delete_assessment(&self, id: Uuid) -> Result<Assessment> {
    self.transact(move |tx| delete_assessment_tx(tx, id)).await
  }

  // ── Structure override ────────────────────────────────────────────────────

  async fn get_structure_override(
    &self,
    assessment_id: Uuid,
  ) -> Result<Option<Structure>> {
    let id_str = encode_uuid(assessment_id);

    let json: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT structure_json FROM structure_overrides
               WHERE assessment_id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    json.as_deref().map(serde_json::from_str).transpose().map_err(Error::from)
  }

  async fn set_structure_override(
    &self,
    assessment_id: Uuid,
    structure: Structure,
  ) -> Result<()> {
    let json = serde_json::to_string(&structure)?;

    self
      .transact(move |tx| {
        require_assessment(tx, assessment_id)?;
        tx.execute(
          "INSERT OR REPLACE INTO structure_overrides (assessment_id, structure_json)
           VALUES (?1, ?2)",
          rusqlite::params![encode_uuid(assessment_id), json],
        )?;
        Ok(())
      })
      .await
  }

  // ── Answers ───────────────────────────────────────────────────────────────

  async fn get_answers(&self, assessment_id: Uuid) -> Result<AnswerMap> {
    let id_str = encode_uuid(assessment_id);

    let rows: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subsection_id, value_json FROM answers WHERE assessment_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut answers = AnswerMap::new();
    for (subsection_id, value_json) in rows {
      answers.insert(subsection_id, serde_json::from_str(&value_json)?);
    }
    Ok(answers)
  }

  async fn apply_answer_patch(
    &self,
    assessment_id: Uuid,
    patch: AnswerPatch,
  ) -> Result<AnswerMap> {
    self
      .transact(move |tx| apply_answer_patch_tx(tx, assessment_id, patch))
      .await
  }

  // ── Memberships & collaborators ───────────────────────────────────────────

  async fn memberships_for(&self, user_id: Uuid) -> Result<Vec<Membership>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawMembership> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, org_id, role FROM memberships
           WHERE user_id = ?1
           ORDER BY joined_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawMembership {
              user_id: row.get(0)?,
              org_id:  row.get(1)?,
              role:    row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMembership::into_membership).collect()
  }

  async fn upsert_membership(
    &self,
    user_id: Uuid,
    org_id: Uuid,
    role: OrgRole,
  ) -> Result<Membership> {
    let user_str = encode_uuid(user_id);
    let org_str  = encode_uuid(org_id);
    let role_str = encode_org_role(role).to_owned();
    let at_str   = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO memberships (user_id, org_id, role, joined_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (user_id, org_id) DO UPDATE SET role = excluded.role",
          rusqlite::params![user_str, org_str, role_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(Membership { user_id, org_id, role })
  }

  async fn collaborators_for(
    &self,
    assessment_id: Uuid,
  ) -> Result<Vec<Collaborator>> {
    let id_str = encode_uuid(assessment_id);
    self
      .transact(move |tx| read_collaborators(tx, &id_str))
      .await
  }

  async fn collaborator_role(
    &self,
    assessment_id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<CollaboratorRole>> {
    let id_str   = encode_uuid(assessment_id);
    let user_str = encode_uuid(user_id);

    let role_str: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT role FROM collaborators
               WHERE assessment_id = ?1 AND user_id = ?2",
              rusqlite::params![id_str, user_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    role_str.as_deref().map(decode_collab_role).transpose()
  }

  async fn upsert_collaborator(
    &self,
    assessment_id: Uuid,
    user_id: Uuid,
    role: CollaboratorRole,
  ) -> Result<Vec<Collaborator>> {
    self
      .transact(move |tx| upsert_collaborator_tx(tx, assessment_id, user_id, role))
      .await
  }

  async fn remove_collaborator(
    &self,
    assessment_id: Uuid,
    user_id: Uuid,
  ) -> Result<()> {
    self
      .transact(move |tx| {
        let affected = tx.execute(
          "DELETE FROM collaborators WHERE assessment_id = ?1 AND user_id = ?2",
          rusqlite::params![encode_uuid(assessment_id), encode_uuid(user_id)],
        )?;
        if affected == 0 {
          return Err(Error::CollaboratorNotFound(user_id));
        }
        Ok(())
      })
      .await
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn list_messages(&self, assessment_id: Uuid) -> Result<Vec<Message>> {
    let id_str = encode_uuid(assessment_id);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           WHERE assessment_id = ?1
           ORDER BY rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], read_message_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  async fn post_message(
    &self,
    assessment_id: Uuid,
    input: NewMessage,
  ) -> Result<Message> {
    self
      .transact(move |tx| post_message_tx(tx, assessment_id, input))
      .await
  }

  async fn delete_message(
    &self,
    assessment_id: Uuid,
    message_id: Uuid,
  ) -> Result<Message> {
    self
      .transact(move |tx| delete_message_tx(tx, assessment_id, message_id))
      .await
  }

  // ── Attachments ───────────────────────────────────────────────────────────

  async fn list_attachments(&self, assessment_id: Uuid) -> Result<Vec<Attachment>> {
    let id_str = encode_uuid(assessment_id);

    let raws: Vec<RawAttachment> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ATTACHMENT_COLUMNS} FROM attachments
           WHERE assessment_id = ?1
           ORDER BY rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], read_attachment_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttachment::into_attachment).collect()
  }

  async fn add_attachment(
    &self,
    assessment_id: Uuid,
    input: NewAttachment,
  ) -> Result<Attachment> {
    let now = Utc::now();
    let attachment = Attachment {
      id: Uuid::new_v4(),
      assessment_id,
      name: input.name,
      created: now,
      modified: now,
      size: input.size,
    };

    let row = attachment.clone();
    self
      .transact(move |tx| {
        require_assessment(tx, assessment_id)?;
        tx.execute(
          "INSERT INTO attachments (attachment_id, assessment_id, name, created, modified, size)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(row.id),
            encode_uuid(row.assessment_id),
            row.name,
            encode_dt(row.created),
            encode_dt(row.modified),
            row.size as i64,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(attachment)
  }

  async fn delete_attachment(
    &self,
    assessment_id: Uuid,
    attachment_id: Uuid,
  ) -> Result<Attachment> {
    self
      .transact(move |tx| delete_attachment_tx(tx, assessment_id, attachment_id))
      .await
  }

  // ── Section-attachment links ──────────────────────────────────────────────

  async fn section_attachments(
    &self,
    assessment_id: Uuid,
    subsection_id: &str,
  ) -> Result<Vec<Uuid>> {
    let id_str  = encode_uuid(assessment_id);
    let sub_str = subsection_id.to_owned();

    self
      .transact(move |tx| read_section_links(tx, &id_str, &sub_str))
      .await
  }

  async fn update_section_attachments(
    &self,
    assessment_id: Uuid,
    subsection_id: &str,
    add: Vec<Uuid>,
    remove: Vec<Uuid>,
  ) -> Result<Vec<Uuid>> {
    let sub_str = subsection_id.to_owned();

    self
      .transact(move |tx| {
        update_section_links_tx(tx, assessment_id, &sub_str, add, remove)
      })
      .await
  }
}
