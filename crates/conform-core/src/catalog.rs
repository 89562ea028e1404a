//! The framework catalog and structure resolution.
//!
//! Templates are read-only and loaded once at startup; the catalog is then
//! shared immutably. Resolution never fails: an unrecognised framework name
//! falls through to a minimal built-in shape so a questionnaire never
//! disappears.

use std::collections::HashMap;

use crate::{
  Result,
  framework::{
    Field, FieldKind, FrameworkTemplate, Item, Part, Section, Structure,
  },
};

/// Built-in template assets, embedded at compile time.
const PCI_DSS_4_0: &str = include_str!("../catalog/pci_dss_4_0.json");

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// A registry of immutable framework templates keyed by display name.
#[derive(Debug, Clone, Default)]
pub struct FrameworkCatalog {
  templates: HashMap<String, FrameworkTemplate>,
}

impl FrameworkCatalog {
  /// An empty catalog; every lookup falls through to the built-in fallback.
  pub fn empty() -> Self {
    Self::default()
  }

  /// Load the catalog of embedded templates. Parsing validates each field's
  /// required payload per variant, so a malformed template is rejected here
  /// rather than at first use.
  pub fn builtin() -> Result<Self> {
    let mut catalog = Self::empty();
    catalog.register("PCI DSS 4.0", serde_json::from_str(PCI_DSS_4_0)?);
    Ok(catalog)
  }

  pub fn register(
    &mut self,
    name: impl Into<String>,
    template: FrameworkTemplate,
  ) {
    self.templates.insert(name.into(), template);
  }

  pub fn get(&self, name: &str) -> Option<&FrameworkTemplate> {
    self.templates.get(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.templates.keys().map(String::as_str)
  }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Resolve the effective questionnaire structure for an assessment.
///
/// Order: a saved per-assessment override, else the catalog template
/// registered under the assessment's framework name, else the built-in
/// fallback. Unknown framework names are not errors.
pub fn resolve_structure(
  override_structure: Option<Structure>,
  framework: Option<&str>,
  catalog: &FrameworkCatalog,
) -> Structure {
  if let Some(structure) = override_structure {
    return structure;
  }

  if let Some(template) = framework.and_then(|name| catalog.get(name)) {
    return Structure { parts: template.parts.clone() };
  }

  fallback_structure()
}

/// The minimal built-in shape served when neither an override nor a template
/// exists.
pub fn fallback_structure() -> Structure {
  Structure {
    parts: vec![Part {
      title:    "Security Controls".into(),
      sections: vec![Section {
        number:  "1".into(),
        heading: "Access Control".into(),
        items:   vec![Item {
          id:     "1.1".into(),
          number: "1.1".into(),
          label:  "User Authentication".into(),
          fields: vec![Field {
            id:       "mfaEnabled".into(),
            label:    "Multi-factor authentication enabled".into(),
            help:     None,
            required: true,
            when:     None,
            kind:     FieldKind::Checkbox,
          }],
        }],
      }],
    }],
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_catalog_parses() {
    let catalog = FrameworkCatalog::builtin().unwrap();
    let template = catalog.get("PCI DSS 4.0").expect("registered template");
    assert_eq!(template.code, "pci-dss-4-0");
    assert!(!template.parts.is_empty());

    // Every item id is unique — answers are keyed by it.
    let mut seen = std::collections::HashSet::new();
    for part in &template.parts {
      for section in &part.sections {
        for item in &section.items {
          assert!(seen.insert(item.id.clone()), "duplicate item {}", item.id);
        }
      }
    }
  }

  #[test]
  fn override_takes_precedence_over_template() {
    let catalog = FrameworkCatalog::builtin().unwrap();
    let custom = Structure {
      parts: vec![Part { title: "Edited".into(), sections: vec![] }],
    };

    let resolved =
      resolve_structure(Some(custom), Some("PCI DSS 4.0"), &catalog);
    assert_eq!(resolved.parts[0].title, "Edited");
  }

  #[test]
  fn known_framework_resolves_to_template() {
    let catalog = FrameworkCatalog::builtin().unwrap();
    let resolved = resolve_structure(None, Some("PCI DSS 4.0"), &catalog);
    assert!(resolved.parts.len() > 1);
  }

  #[test]
  fn unknown_framework_falls_back_without_error() {
    let catalog = FrameworkCatalog::builtin().unwrap();
    let resolved = resolve_structure(None, Some("ISO 99999"), &catalog);
    assert!(!resolved.parts.is_empty());
    assert_eq!(resolved.parts[0].sections[0].items[0].id, "1.1");
  }

  #[test]
  fn missing_framework_name_falls_back() {
    let resolved = resolve_structure(None, None, &FrameworkCatalog::empty());
    assert!(!resolved.parts.is_empty());
  }
}
