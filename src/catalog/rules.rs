//! Matrix-level relationship rules.
//!
//! Rules are declared independently of any one skill. The crate ships a
//! built-in rule set (the category taxonomy); a source may supply its own
//! `skills-matrix.yaml`, which is merged on top.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SmithError};

use super::types::CategoryDefinition;

const BUILTIN_RULES: &str = include_str!("builtin_rules.yaml");

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationshipRules {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryDefinition>,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub skill_aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub per_skill: BTreeMap<String, PerSkillRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relationships {
    #[serde(default)]
    pub conflicts: Vec<ConflictRule>,
    #[serde(default)]
    pub discourages: Vec<DiscourageRule>,
    #[serde(default)]
    pub recommends: Vec<RecommendRule>,
    #[serde(default)]
    pub requires: Vec<RequireRule>,
    #[serde(default)]
    pub alternatives: Vec<AlternativeGroup>,
}

/// The listed skills mutually conflict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConflictRule {
    pub skills: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

/// Selecting any of the listed skills together is discouraged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscourageRule {
    pub skills: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

/// Selecting `when` recommends every skill in `suggest`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendRule {
    pub when: String,
    pub suggest: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

/// `skill` needs all (or, with `needs_any`, one) of `needs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequireRule {
    pub skill: String,
    pub needs: Vec<String>,
    #[serde(default)]
    pub needs_any: bool,
    #[serde(default)]
    pub reason: String,
}

/// Interchangeable skills serving the same purpose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlternativeGroup {
    pub purpose: String,
    pub skills: Vec<String>,
}

/// Per-skill overrides keyed by skill reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerSkillRule {
    #[serde(default)]
    pub usage_guidance: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RelationshipRules {
    /// The rule set compiled into the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_RULES)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|err| {
            SmithError::ValidationFailed(format!("relationship rules YAML parse error: {err}"))
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            SmithError::Config(format!("read rules {}: {err}", path.display()))
        })?;
        Self::from_yaml_str(&content).map_err(|err| {
            SmithError::ValidationFailed(format!("{} ({})", err, path.display()))
        })
    }

    /// Merge a source-supplied rule set on top of this one.
    ///
    /// Relationship lists are concatenated without deduplication. Keyed
    /// tables (categories, aliases, per-skill rules) take the source's entry
    /// on collision.
    #[must_use]
    pub fn merge(mut self, source: Self) -> Self {
        if !source.version.is_empty() {
            self.version = source.version;
        }
        self.categories.extend(source.categories);
        self.skill_aliases.extend(source.skill_aliases);
        self.per_skill.extend(source.per_skill);

        let rel = &mut self.relationships;
        rel.conflicts.extend(source.relationships.conflicts);
        rel.discourages.extend(source.relationships.discourages);
        rel.recommends.extend(source.relationships.recommends);
        rel.requires.extend(source.relationships.requires);
        rel.alternatives.extend(source.relationships.alternatives);
        self
    }
}
