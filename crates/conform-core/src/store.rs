//! The `AssessmentStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `conform-store-sqlite`). The API layer depends on this abstraction, not
//! on any concrete backend.
//!
//! Every mutating operation must be atomic per assessment: a backend wraps
//! the full read-modify-write in a transaction (or an equivalent per-key
//! mutual-exclusion scope) so concurrent requests racing on the same
//! assessment cannot interleave mid-merge.

use std::future::Future;

use uuid::Uuid;

use crate::{
  access::{Collaborator, CollaboratorRole, Membership, OrgRole},
  answer::{AnswerMap, AnswerPatch},
  assessment::{Assessment, AssessmentUpdate, NewAssessment},
  attachment::{Attachment, NewAttachment},
  framework::Structure,
  message::{Message, NewMessage},
};

/// Abstraction over a Conform storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AssessmentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Assessments ───────────────────────────────────────────────────────

  /// Create an assessment. Missing optional fields take the documented
  /// defaults (`backlog`, `"30 days"`, framework `"Custom"`).
  fn create_assessment(
    &self,
    input: NewAssessment,
  ) -> impl Future<Output = Result<Assessment, Self::Error>> + Send + '_;

  /// Retrieve an assessment by id. Returns `None` if not found.
  fn get_assessment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Assessment>, Self::Error>> + Send + '_;

  /// List assessments; `archived_only` restricts to the archived column.
  fn list_assessments(
    &self,
    archived_only: bool,
  ) -> impl Future<Output = Result<Vec<Assessment>, Self::Error>> + Send + '_;

  /// Apply a field-wise update. Errors if the assessment does not exist.
  fn update_assessment(
    &self,
    id: Uuid,
    update: AssessmentUpdate,
  ) -> impl Future<Output = Result<Assessment, Self::Error>> + Send + '_;

  /// Soft delete: move to the `archived` column.
  fn archive_assessment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Assessment, Self::Error>> + Send + '_;

  /// Move an archived assessment back to `backlog`.
  fn unarchive_assessment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Assessment, Self::Error>> + Send + '_;

  /// Hard delete. Cascades removal of the assessment's answers, messages,
  /// attachments, section links, collaborators, and structure override.
  fn delete_assessment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Assessment, Self::Error>> + Send + '_;

  // ── Structure override ────────────────────────────────────────────────

  /// The saved per-assessment override structure, if any.
  fn get_structure_override(
    &self,
    assessment_id: Uuid,
  ) -> impl Future<Output = Result<Option<Structure>, Self::Error>> + Send + '_;

  /// Save (or replace) the override structure, preserving questionnaire
  /// edits across template changes.
  fn set_structure_override(
    &self,
    assessment_id: Uuid,
    structure: Structure,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Answers ───────────────────────────────────────────────────────────

  /// The full answer map for an assessment; empty if nothing stored.
  fn get_answers(
    &self,
    assessment_id: Uuid,
  ) -> impl Future<Output = Result<AnswerMap, Self::Error>> + Send + '_;

  /// Merge a patch into the stored answers per the rules in
  /// [`crate::answer`] and return the resulting map. The entire patch is
  /// applied atomically; writes are immediately visible to later reads.
  fn apply_answer_patch(
    &self,
    assessment_id: Uuid,
    patch: AnswerPatch,
  ) -> impl Future<Output = Result<AnswerMap, Self::Error>> + Send + '_;

  // ── Memberships & collaborators ───────────────────────────────────────

  /// All org memberships for a user, in join order.
  fn memberships_for(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Membership>, Self::Error>> + Send + '_;

  /// Insert or update a membership by (user, org).
  fn upsert_membership(
    &self,
    user_id: Uuid,
    org_id: Uuid,
    role: OrgRole,
  ) -> impl Future<Output = Result<Membership, Self::Error>> + Send + '_;

  /// The assessment's collaborator ACL rows.
  fn collaborators_for(
    &self,
    assessment_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Collaborator>, Self::Error>> + Send + '_;

  /// A single user's ACL role for an assessment, if any.
  fn collaborator_role(
    &self,
    assessment_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<CollaboratorRole>, Self::Error>> + Send + '_;

  /// Insert or update an ACL row by (assessment, user); returns the full
  /// list afterwards.
  fn upsert_collaborator(
    &self,
    assessment_id: Uuid,
    user_id: Uuid,
    role: CollaboratorRole,
  ) -> impl Future<Output = Result<Vec<Collaborator>, Self::Error>> + Send + '_;

  /// Remove a user's ACL row. Errors if no row exists.
  fn remove_collaborator(
    &self,
    assessment_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  /// All messages for an assessment in post order.
  fn list_messages(
    &self,
    assessment_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  /// Post a message. Implicit section tags and mentions must already be
  /// merged (see [`NewMessage::with_extracted_tags`]); the store validates
  /// that a reply's parent is an existing root in the same assessment.
  fn post_message(
    &self,
    assessment_id: Uuid,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Delete a message and return it. Deleting a root also deletes its
  /// replies.
  fn delete_message(
    &self,
    assessment_id: Uuid,
    message_id: Uuid,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  // ── Attachments ───────────────────────────────────────────────────────

  fn list_attachments(
    &self,
    assessment_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Attachment>, Self::Error>> + Send + '_;

  /// Register attachment metadata (bytes live in the external blob store).
  fn add_attachment(
    &self,
    assessment_id: Uuid,
    input: NewAttachment,
  ) -> impl Future<Output = Result<Attachment, Self::Error>> + Send + '_;

  /// Delete an attachment and return it. Cascade-removes the id from every
  /// subsection's link set for the assessment.
  fn delete_attachment(
    &self,
    assessment_id: Uuid,
    attachment_id: Uuid,
  ) -> impl Future<Output = Result<Attachment, Self::Error>> + Send + '_;

  // ── Section-attachment links ──────────────────────────────────────────

  /// Attachment ids linked to one subsection.
  fn section_attachments<'a>(
    &'a self,
    assessment_id: Uuid,
    subsection_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + 'a;

  /// Add and remove links in one atomic step and return the resulting ids.
  /// Adding an id absent from the assessment's attachment set is a silent
  /// no-op, as is removing an unlinked id.
  fn update_section_attachments<'a>(
    &'a self,
    assessment_id: Uuid,
    subsection_id: &'a str,
    add: Vec<Uuid>,
    remove: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + 'a;
}
