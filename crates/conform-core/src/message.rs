//! Threaded messages scoped to an assessment.
//!
//! Messages form a root/reply graph capped at one nesting level: a reply's
//! parent must be a root message in the same assessment. At post time the
//! text is scanned for `#<dotted-number>` section tags and `@<token>`
//! mentions, which are merged with any explicitly supplied ones. Messages
//! are immutable once posted except for deletion.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub id:            Uuid,
  pub assessment_id: Uuid,
  /// Display name of the poster.
  pub author:        String,
  pub posted_at:     DateTime<Utc>,
  pub text:          String,
  /// `None` for roots; for replies, the id of a root in the same assessment.
  pub parent_id:     Option<Uuid>,
  /// Subsection ids this message is tagged to, e.g. `"3.2"`.
  pub sections:      Vec<String>,
  pub attachments:   Vec<Uuid>,
  /// Mention tokens including the leading `@`, e.g. `"@jane"`.
  pub mentions:      Vec<String>,
}

/// Input to [`crate::store::AssessmentStore::post_message`]. The id and
/// timestamp are set by the store; implicit section tags and mentions are
/// extracted from `text` via [`NewMessage::with_extracted_tags`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
  pub author:      String,
  pub text:        String,
  #[serde(default)]
  pub parent_id:   Option<Uuid>,
  #[serde(default)]
  pub sections:    Vec<String>,
  #[serde(default)]
  pub attachments: Vec<Uuid>,
  #[serde(default)]
  pub mentions:    Vec<String>,
}

impl NewMessage {
  pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
    Self {
      author:      author.into(),
      text:        text.into(),
      parent_id:   None,
      sections:    Vec::new(),
      attachments: Vec::new(),
      mentions:    Vec::new(),
    }
  }

  pub fn reply_to(mut self, parent_id: Uuid) -> Self {
    self.parent_id = Some(parent_id);
    self
  }

  /// Merge tags extracted from the text into the explicit ones, explicit
  /// first, deduplicated.
  pub fn with_extracted_tags(mut self) -> Self {
    self.sections = merge_unique(self.sections, extract_section_tags(&self.text));
    self.mentions = merge_unique(self.mentions, extract_mentions(&self.text));
    self
  }
}

// ─── Tag extraction ──────────────────────────────────────────────────────────

static SECTION_TAG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"#([0-9]+(?:\.[0-9]+)*)").unwrap());

static MENTION: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)@([a-z0-9_.\-]+)").unwrap());

/// Subsection ids referenced as `#<dotted-number>` tokens, without the `#`.
pub fn extract_section_tags(text: &str) -> Vec<String> {
  SECTION_TAG
    .captures_iter(text)
    .map(|c| c[1].to_string())
    .collect()
}

/// Mention tokens referenced as `@<token>`, stored with the leading `@`.
pub fn extract_mentions(text: &str) -> Vec<String> {
  MENTION
    .captures_iter(text)
    .map(|c| format!("@{}", &c[1]))
    .collect()
}

fn merge_unique(explicit: Vec<String>, implicit: Vec<String>) -> Vec<String> {
  let mut out = Vec::with_capacity(explicit.len() + implicit.len());
  for tag in explicit.into_iter().chain(implicit) {
    if !tag.is_empty() && !out.contains(&tag) {
      out.push(tag);
    }
  }
  out
}

// ─── Thread grouping ─────────────────────────────────────────────────────────

/// A root message with its replies, for display. Nesting is exactly one
/// level deep.
#[derive(Debug, Clone, Serialize)]
pub struct Thread {
  pub root:    Message,
  pub replies: Vec<Message>,
}

/// Group a flat, chronologically ordered message list into threads. Roots
/// keep their order; replies keep theirs under each root.
pub fn thread(messages: Vec<Message>) -> Vec<Thread> {
  let mut threads: Vec<Thread> = Vec::new();

  let (roots, replies): (Vec<_>, Vec<_>) =
    messages.into_iter().partition(|m| m.parent_id.is_none());

  for root in roots {
    threads.push(Thread { root, replies: Vec::new() });
  }
  for reply in replies {
    if let Some(t) = threads
      .iter_mut()
      .find(|t| Some(t.root.id) == reply.parent_id)
    {
      t.replies.push(reply);
    }
  }

  threads
}

#[cfg(test)]
mod tests {
  use super::*;

  fn message(parent_id: Option<Uuid>) -> Message {
    Message {
      id: Uuid::new_v4(),
      assessment_id: Uuid::new_v4(),
      author: "jo".into(),
      posted_at: Utc::now(),
      text: "hi".into(),
      parent_id,
      sections: vec![],
      attachments: vec![],
      mentions: vec![],
    }
  }

  #[test]
  fn extracts_section_tags_and_mentions() {
    let m = NewMessage::new("jo", "See #3.2 and ping @jane")
      .with_extracted_tags();
    assert_eq!(m.sections, ["3.2"]);
    assert_eq!(m.mentions, ["@jane"]);
  }

  #[test]
  fn dotted_numbers_of_any_depth() {
    assert_eq!(
      extract_section_tags("covered in #1, #1.2 and #12.3.4"),
      ["1", "1.2", "12.3.4"]
    );
  }

  #[test]
  fn mention_token_charset() {
    assert_eq!(
      extract_mentions("cc @a.b @c-d @E_9 but not plain@text.stop"),
      // An `@` mid-word still matches the token after it, as the original
      // questionnaire client did.
      ["@a.b", "@c-d", "@E_9", "@text.stop"]
    );
  }

  #[test]
  fn explicit_tags_come_first_and_are_deduplicated() {
    let m = NewMessage {
      author:      "jo".into(),
      text:        "see #3.2 and #4.1, thanks @jane".into(),
      parent_id:   None,
      sections:    vec!["4.1".into()],
      attachments: vec![],
      mentions:    vec!["@jane".into()],
    }
    .with_extracted_tags();

    assert_eq!(m.sections, ["4.1", "3.2"]);
    assert_eq!(m.mentions, ["@jane"]);
  }

  #[test]
  fn no_tags_in_plain_text() {
    let m = NewMessage::new("jo", "nothing to see here").with_extracted_tags();
    assert!(m.sections.is_empty());
    assert!(m.mentions.is_empty());
  }

  #[test]
  fn threading_groups_replies_under_roots() {
    let root_a = message(None);
    let root_b = message(None);
    let reply_a1 = message(Some(root_a.id));
    let reply_b1 = message(Some(root_b.id));
    let reply_a2 = message(Some(root_a.id));

    let threads = thread(vec![
      root_a.clone(),
      root_b.clone(),
      reply_a1.clone(),
      reply_b1.clone(),
      reply_a2.clone(),
    ]);

    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].root.id, root_a.id);
    assert_eq!(
      threads[0].replies.iter().map(|m| m.id).collect::<Vec<_>>(),
      [reply_a1.id, reply_a2.id]
    );
    assert_eq!(threads[1].replies.len(), 1);
    assert_eq!(threads[1].replies[0].id, reply_b1.id);
  }
}
