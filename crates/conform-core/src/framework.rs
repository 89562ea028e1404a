//! The questionnaire field model — the shape of everything an assessor fills
//! in.
//!
//! A framework template is a tree of Parts → Sections → Items → Fields. The
//! item (also called a subsection, e.g. `"1.2"`) is the smallest addressable
//! unit: answers, attachment links, and message tags are all keyed by item
//! id. Fields are a tagged union over their `type` discriminant; a field may
//! carry a [`Condition`] that gates its visibility on a previously stored
//! answer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Alias for the JSON object shape used by answer values.
pub type JsonMap = serde_json::Map<String, Value>;

// ─── Structure tree ──────────────────────────────────────────────────────────

/// The effective questionnaire shape for one assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
  pub parts: Vec<Part>,
}

/// An immutable, versioned questionnaire template, keyed by framework display
/// name (e.g. `"PCI DSS 4.0"`) in the [`catalog`](crate::catalog).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkTemplate {
  /// Stable machine identifier, e.g. `"pci-dss-4-0"`.
  pub code:  String,
  pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
  pub title:    String,
  pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
  pub number:  String,
  pub heading: String,
  pub items:   Vec<Item>,
}

/// A subsection — owns its own answer object in the answer map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
  pub id:     String,
  pub number: String,
  pub label:  String,
  pub fields: Vec<Field>,
}

// ─── Conditional visibility ──────────────────────────────────────────────────

/// A visibility predicate: the field is shown only if the named answer equals
/// `equals` (strict JSON equality) or, if `equals` is omitted, is truthy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
  #[serde(alias = "field")]
  pub field_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none", alias = "eq")]
  pub equals:   Option<Value>,
}

/// JS-style truthiness, matching how stored answers were interpreted by the
/// questionnaire UI: null/false/0/"" are falsy; arrays and objects are truthy.
fn truthy(v: &Value) -> bool {
  match v {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(_) | Value::Object(_) => true,
  }
}

impl Condition {
  /// Evaluate against the governing value, looked up in `primary` first and
  /// then in `fallback`. Callers choose the scopes: the subsection's answer
  /// object for top-level fields, the current row for table columns.
  ///
  /// Never cached — re-evaluated on every answer change so toggling a
  /// governing field immediately shows or hides its dependents.
  pub fn is_met(
    &self,
    primary: Option<&JsonMap>,
    fallback: Option<&JsonMap>,
  ) -> bool {
    let value = primary
      .and_then(|m| m.get(&self.field_id))
      .or_else(|| fallback.and_then(|m| m.get(&self.field_id)));

    match (&self.equals, value) {
      (Some(expected), Some(actual)) => actual == expected,
      (Some(_), None) => false,
      (None, Some(actual)) => truthy(actual),
      (None, None) => false,
    }
  }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// Shared envelope for every field; the `type`-specific payload lives in
/// [`FieldKind`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
  pub id:       String,
  #[serde(default)]
  pub label:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub help:     Option<String>,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub required: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub when:     Option<Condition>,
  #[serde(flatten)]
  pub kind:     FieldKind,
}

impl Field {
  /// Visibility of a top-level field given the subsection's answer object.
  pub fn is_visible(&self, answers: Option<&JsonMap>) -> bool {
    match &self.when {
      None => true,
      Some(cond) => cond.is_met(answers, None),
    }
  }
}

/// The typed payload of a field. The variant name serves as the `type`
/// discriminant in the template JSON. Required payload (radio options, table
/// columns, ...) is validated per variant when the template is parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum FieldKind {
  // ── Scalar inputs ────────────────────────────────────────────────────────
  Text,
  Textarea,
  Number,
  Date,
  Checkbox,

  // ── Choice inputs ────────────────────────────────────────────────────────
  Radio {
    options: Vec<String>,
  },
  /// One radio group per row, sharing the same option set.
  RadioTable {
    options: Vec<String>,
    rows:    Vec<TableRow>,
  },
  /// A grid of independent checkboxes.
  CheckboxTable {
    columns: Vec<TableColumn>,
    rows:    Vec<TableRow>,
  },

  // ── Composite inputs ─────────────────────────────────────────────────────
  /// A fixed set of labelled sub-inputs stored as one nested object.
  FormTable {
    rows: Vec<FormRow>,
  },
  /// A repeatable list of rows; the answer is an array of row objects.
  TableList {
    columns:  Vec<ListColumn>,
    #[serde(default)]
    min_rows: u32,
  },
  /// File slots; the answer holds attachment references.
  Dropzone,

  // ── Presentation-only ────────────────────────────────────────────────────
  Heading,
  Alert {
    #[serde(default, rename = "variant")]
    level: AlertLevel,
  },
  Divider,
}

impl FieldKind {
  /// Presentation-only fields never carry an answer.
  pub fn is_input(&self) -> bool {
    !matches!(self, Self::Heading | Self::Alert { .. } | Self::Divider)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
  #[default]
  Info,
  Warning,
}

// ─── Sub-field shapes ────────────────────────────────────────────────────────

/// The input widget of a form-table row or table-list column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowInput {
  #[default]
  Text,
  Textarea,
  Number,
  Date,
  Checkboxes,
}

/// A labelled sub-input inside a form-table. Its answer is stored under the
/// owning field's object, keyed by the row id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormRow {
  pub id:    String,
  pub label: String,
  #[serde(rename = "type", default)]
  pub input: RowInput,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub help:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub when:  Option<Condition>,
}

impl FormRow {
  /// A row condition reads the owning field's nested object first and falls
  /// back to the subsection's top-level answers.
  pub fn is_visible(
    &self,
    field_answers: Option<&JsonMap>,
    item_answers: Option<&JsonMap>,
  ) -> bool {
    match &self.when {
      None => true,
      Some(cond) => cond.is_met(field_answers, item_answers),
    }
  }
}

/// A column of a repeatable table-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListColumn {
  pub id:      String,
  pub label:   String,
  #[serde(rename = "type", default)]
  pub input:   RowInput,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub options: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub when:    Option<Condition>,
}

impl ListColumn {
  /// A column condition reads only the current row.
  pub fn is_visible(&self, row: Option<&JsonMap>) -> bool {
    match &self.when {
      None => true,
      Some(cond) => cond.is_met(row, None),
    }
  }
}

/// A row of a radio-table or checkbox-table grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
  pub id:    String,
  pub label: String,
}

/// A column of a checkbox-table grid, optionally grouped under a banner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
  pub id:    String,
  pub label: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub group: Option<String>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn obj(v: Value) -> JsonMap {
    match v {
      Value::Object(m) => m,
      _ => panic!("expected object"),
    }
  }

  fn radio_field(when: Option<Condition>) -> Field {
    Field {
      id: "details".into(),
      label: "Details".into(),
      help: None,
      required: false,
      when,
      kind: FieldKind::Textarea,
    }
  }

  #[test]
  fn no_condition_is_always_visible() {
    let f = radio_field(None);
    assert!(f.is_visible(None));
    assert!(f.is_visible(Some(&obj(json!({"other": "x"})))));
  }

  #[test]
  fn equals_condition_is_strict() {
    let f = radio_field(Some(Condition {
      field_id: "segmentationUsed".into(),
      equals:   Some(json!("Yes")),
    }));

    assert!(f.is_visible(Some(&obj(json!({"segmentationUsed": "Yes"})))));
    assert!(!f.is_visible(Some(&obj(json!({"segmentationUsed": "No"})))));
    // Strict equality: no type coercion.
    assert!(!f.is_visible(Some(&obj(json!({"segmentationUsed": true})))));
    // Absent answer hides the field.
    assert!(!f.is_visible(Some(&obj(json!({})))));
    assert!(!f.is_visible(None));
  }

  #[test]
  fn truthy_condition_without_equals() {
    let f = radio_field(Some(Condition {
      field_id: "enabled".into(),
      equals:   None,
    }));

    assert!(f.is_visible(Some(&obj(json!({"enabled": true})))));
    assert!(f.is_visible(Some(&obj(json!({"enabled": "yes"})))));
    assert!(f.is_visible(Some(&obj(json!({"enabled": 1})))));
    assert!(f.is_visible(Some(&obj(json!({"enabled": []})))));
    assert!(!f.is_visible(Some(&obj(json!({"enabled": false})))));
    assert!(!f.is_visible(Some(&obj(json!({"enabled": ""})))));
    assert!(!f.is_visible(Some(&obj(json!({"enabled": 0})))));
    assert!(!f.is_visible(Some(&obj(json!({"enabled": null})))));
    assert!(!f.is_visible(Some(&obj(json!({})))));
  }

  #[test]
  fn toggling_governing_answer_flips_visibility() {
    let f = radio_field(Some(Condition {
      field_id: "subcontractorsUsed".into(),
      equals:   Some(json!("Yes")),
    }));

    let mut answers = obj(json!({"subcontractorsUsed": "Yes"}));
    assert!(f.is_visible(Some(&answers)));

    answers.insert("subcontractorsUsed".into(), json!("No"));
    assert!(!f.is_visible(Some(&answers)));
  }

  #[test]
  fn form_row_checks_nested_object_before_item_answers() {
    let row = FormRow {
      id:    "segmentationDescription".into(),
      label: "Describe the segmentation".into(),
      input: RowInput::Textarea,
      help:  None,
      when:  Some(Condition {
        field_id: "segmentationUsed".into(),
        equals:   Some(json!("Yes")),
      }),
    };

    // Governing value inside the owning field's nested object wins.
    let nested = obj(json!({"segmentationUsed": "Yes"}));
    let item = obj(json!({"segmentationUsed": "No"}));
    assert!(row.is_visible(Some(&nested), Some(&item)));

    // Falls back to the subsection's answers when not nested.
    let empty = obj(json!({}));
    let item = obj(json!({"segmentationUsed": "Yes"}));
    assert!(row.is_visible(Some(&empty), Some(&item)));
    assert!(!row.is_visible(Some(&empty), Some(&obj(json!({})))));
  }

  #[test]
  fn list_column_reads_only_current_row() {
    let col = ListColumn {
      id:      "endDate".into(),
      label:   "End date".into(),
      input:   RowInput::Date,
      options: vec![],
      when:    Some(Condition {
        field_id: "ongoing".into(),
        equals:   Some(json!("No")),
      }),
    };

    assert!(col.is_visible(Some(&obj(json!({"ongoing": "No"})))));
    assert!(!col.is_visible(Some(&obj(json!({"ongoing": "Yes"})))));
    assert!(!col.is_visible(None));
  }

  #[test]
  fn field_json_round_trips_through_tagged_union() {
    let raw = json!({
      "id": "remoteTestingReason",
      "type": "textarea",
      "label": "Why was onsite testing not feasible?",
      "when": { "fieldId": "remoteTestingUsed", "equals": "Yes" }
    });

    let field: Field = serde_json::from_value(raw).unwrap();
    assert!(matches!(field.kind, FieldKind::Textarea));
    assert_eq!(field.when.as_ref().unwrap().field_id, "remoteTestingUsed");

    let back = serde_json::to_value(&field).unwrap();
    assert_eq!(back["type"], "textarea");
  }

  #[test]
  fn condition_accepts_legacy_field_alias() {
    let raw = json!({ "field": "subcontractorsUsed", "equals": "Yes" });
    let cond: Condition = serde_json::from_value(raw).unwrap();
    assert_eq!(cond.field_id, "subcontractorsUsed");
  }

  #[test]
  fn unknown_field_type_fails_at_parse_time() {
    let raw = json!({ "id": "x", "type": "hologram", "label": "X" });
    assert!(serde_json::from_value::<Field>(raw).is_err());
  }

  #[test]
  fn radio_without_options_fails_at_parse_time() {
    let raw = json!({ "id": "x", "type": "radio", "label": "X" });
    assert!(serde_json::from_value::<Field>(raw).is_err());
  }

  #[test]
  fn presentation_fields_are_not_inputs() {
    assert!(!FieldKind::Heading.is_input());
    assert!(!FieldKind::Divider.is_input());
    assert!(!FieldKind::Alert { level: AlertLevel::Info }.is_input());
    assert!(FieldKind::Text.is_input());
    assert!(FieldKind::Dropzone.is_input());
  }
}
