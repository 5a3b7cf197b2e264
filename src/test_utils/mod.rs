//! Shared test utilities: on-disk source fixtures, scoped log capture and
//! in-memory catalog builders.

pub mod fixtures;
pub mod logging;

use std::path::PathBuf;

use crate::catalog::{Catalog, ExtractionContext, RawSkill, RelationshipRules, build_catalog};

/// A raw skill record with no relations, described as `About <id>`.
#[must_use]
pub fn raw_skill(id: &str, category: &str) -> RawSkill {
    RawSkill {
        id: id.to_string(),
        directory_path: id.to_string(),
        category: category.to_string(),
        category_exclusive: false,
        display_name: id.to_string(),
        description: format!("About {id}"),
        usage_guidance: None,
        tags: Vec::new(),
        author: None,
        custom: false,
        conflicts_with: Vec::new(),
        compatible_with: Vec::new(),
        requires: Vec::new(),
        requires_setup: Vec::new(),
        provides_setup_for: Vec::new(),
        discourages: Vec::new(),
        path: PathBuf::from(format!("/skills/{id}")),
    }
}

/// Build a catalog from records and a rule set layered over the built-in
/// one. Panics on invalid rule YAML.
#[must_use]
pub fn catalog_with_rules(skills: Vec<RawSkill>, rules_yaml: &str) -> Catalog {
    let rules = RelationshipRules::builtin()
        .expect("built-in rules parse")
        .merge(RelationshipRules::from_yaml_str(rules_yaml).expect("test rules parse"));
    build_catalog(skills, Vec::new(), &rules, &ExtractionContext::default())
}
