//! Catalog record types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sources::SourceDescriptor;

/// Reason attached to relations declared on the skill itself.
pub const METADATA_REASON: &str = "defined in skill metadata";

/// A skill as extracted from one source, with unresolved references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawSkill {
    /// Identifier declared in the SKILL.md frontmatter.
    pub id: String,
    /// Directory path relative to the skills root, `/`-separated.
    pub directory_path: String,
    pub category: String,
    #[serde(default)]
    pub category_exclusive: bool,
    pub display_name: String,
    pub description: String,
    #[serde(default)]
    pub usage_guidance: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub conflicts_with: Vec<String>,
    #[serde(default)]
    pub compatible_with: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub requires_setup: Vec<String>,
    #[serde(default)]
    pub provides_setup_for: Vec<String>,
    #[serde(default)]
    pub discourages: Vec<String>,
    /// Absolute path of the skill directory.
    pub path: PathBuf,
}

/// A directed relation to another skill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillRelation {
    pub skill_id: String,
    pub reason: String,
}

impl SkillRelation {
    pub fn new(skill_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            skill_id: skill_id.into(),
            reason: reason.into(),
        }
    }
}

/// A prerequisite group. With `needs_any` one member suffices, otherwise
/// every member is required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequireGroup {
    pub skill_ids: Vec<String>,
    #[serde(default)]
    pub needs_any: bool,
    pub reason: String,
}

impl RequireGroup {
    /// Whether the selection satisfies this group.
    #[must_use]
    pub fn is_satisfied_by(&self, selected: &[&str]) -> bool {
        if self.needs_any {
            self.skill_ids.iter().any(|id| selected.contains(&id.as_str()))
        } else {
            self.skill_ids.iter().all(|id| selected.contains(&id.as_str()))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillAlternative {
    pub purpose: String,
    pub skill_id: String,
}

/// A skill whose references are canonical IDs, with inverse edges and
/// source tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedSkill {
    pub id: String,
    pub directory_path: String,
    pub category: String,
    pub category_exclusive: bool,
    pub display_name: String,
    pub description: String,
    pub usage_guidance: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub custom: bool,
    pub path: PathBuf,

    pub conflicts_with: Vec<SkillRelation>,
    pub discourages: Vec<SkillRelation>,
    pub recommends: Vec<SkillRelation>,
    pub recommended_by: Vec<SkillRelation>,
    pub requires: Vec<RequireGroup>,
    pub required_by: Vec<SkillRelation>,
    pub alternatives: Vec<SkillAlternative>,

    pub compatible_with: Vec<String>,
    pub requires_setup: Vec<String>,
    pub provides_setup_for: Vec<String>,

    #[serde(default)]
    pub available_sources: Vec<SourceDescriptor>,
    #[serde(default)]
    pub active_source: Option<SourceDescriptor>,
}

impl ResolvedSkill {
    /// Last segment of the category, e.g. `framework` for `web/framework`.
    #[must_use]
    pub fn subcategory(&self) -> &str {
        self.category.rsplit('/').next().unwrap_or(&self.category)
    }

    /// All outgoing skill references, used for dangling-reference checks.
    pub fn outgoing_references(&self) -> impl Iterator<Item = &str> {
        self.conflicts_with
            .iter()
            .chain(&self.discourages)
            .chain(&self.recommends)
            .map(|r| r.skill_id.as_str())
            .chain(
                self.requires
                    .iter()
                    .flat_map(|g| g.skill_ids.iter().map(String::as_str)),
            )
            .chain(self.alternatives.iter().map(|a| a.skill_id.as_str()))
            .chain(self.compatible_with.iter().map(String::as_str))
            .chain(self.requires_setup.iter().map(String::as_str))
            .chain(self.provides_setup_for.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exclusive: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub custom: bool,
}

/// An agent definition extracted from a source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentDefinition {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub custom: bool,
    /// Directory holding the agent's fragments.
    #[serde(default)]
    pub path: PathBuf,
}

/// The resolved, bidirectionally linked skill catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub categories: BTreeMap<String, CategoryDefinition>,
    pub skills: BTreeMap<String, ResolvedSkill>,
    pub aliases: BTreeMap<String, String>,
    pub agents: BTreeMap<String, AgentDefinition>,
}

impl Catalog {
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ResolvedSkill> {
        self.skills.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.skills.contains_key(id)
    }

    /// Skills in a category, in ID order.
    pub fn skills_in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a ResolvedSkill> + 'a {
        self.skills.values().filter(move |s| s.category == category)
    }
}
