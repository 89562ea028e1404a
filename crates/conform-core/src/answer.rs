//! Answer storage types and the merge-patch rules.
//!
//! An assessment's answers are a map from subsection (item) id to that
//! subsection's answer value — a scalar, an array (table-list rows), or a
//! field-keyed object. Saves are partial: clients submit a patch covering
//! only the subsections they touched, and the store merges it field-by-field
//! so concurrent edits to different fields of the same subsection both
//! survive. Edits to the same field are last-writer-wins with no conflict
//! detection.

use std::collections::BTreeMap;

use serde_json::Value;

/// Stored answers for one assessment, keyed by subsection id.
pub type AnswerMap = BTreeMap<String, Value>;

/// A partial update. `Value::Null` for a subsection is an explicit clear:
/// the entry is removed entirely, not set to null.
pub type AnswerPatch = BTreeMap<String, Value>;

/// Merge one subsection's incoming value into its existing value.
///
/// - `Null` clears the entry (returns `None`).
/// - Two non-array objects shallow-merge: incoming keys overwrite matching
///   field ids, all others are preserved.
/// - Anything else replaces wholesale (scalars, arrays, type changes).
pub fn merge_value(existing: Option<Value>, incoming: Value) -> Option<Value> {
  match (existing, incoming) {
    (_, Value::Null) => None,
    (Some(Value::Object(mut base)), Value::Object(update)) => {
      for (field_id, value) in update {
        base.insert(field_id, value);
      }
      Some(Value::Object(base))
    }
    (_, incoming) => Some(incoming),
  }
}

/// Apply a patch to an answer map in place, one subsection at a time.
pub fn apply_patch(answers: &mut AnswerMap, patch: AnswerPatch) {
  for (subsection_id, incoming) in patch {
    if let Some(merged) = merge_value(answers.remove(&subsection_id), incoming)
    {
      answers.insert(subsection_id, merged);
    }
  }
}
