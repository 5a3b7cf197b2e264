//! Agent mappings: which agents receive which categories by default and
//! which categories an agent preloads.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SmithError};

const DEFAULT_MAPPINGS: &str = include_str!("default_mappings.yaml");

/// Wildcard agent: the category goes to every agent.
pub const ALL_AGENTS: &str = "*";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentMappings {
    /// Category pattern (`web/testing`, `web/*`, `*`) to agent names.
    #[serde(default)]
    pub skill_to_agents: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub preload_patterns: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub subcategory_aliases: BTreeMap<String, String>,
}

impl AgentMappings {
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(DEFAULT_MAPPINGS)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|err| {
            SmithError::ValidationFailed(format!("agent mappings YAML parse error: {err}"))
        })
    }

    /// Load a source's mappings. Sections the file leaves empty keep the
    /// built-in defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            SmithError::Config(format!("read agent mappings {}: {err}", path.display()))
        })?;
        let loaded = Self::from_yaml_str(&content)?;
        let mut mappings = Self::builtin()?;
        if !loaded.skill_to_agents.is_empty() {
            mappings.skill_to_agents = loaded.skill_to_agents;
        }
        if !loaded.preload_patterns.is_empty() {
            mappings.preload_patterns = loaded.preload_patterns;
        }
        if !loaded.subcategory_aliases.is_empty() {
            mappings.subcategory_aliases = loaded.subcategory_aliases;
        }
        Ok(mappings)
    }

    /// Whether `agent` receives skills of `category` by default.
    #[must_use]
    pub fn agent_receives(&self, agent: &str, category: &str) -> bool {
        self.skill_to_agents.iter().any(|(pattern, agents)| {
            category_matches(pattern, category)
                && agents.iter().any(|a| a == agent || a == ALL_AGENTS)
        })
    }

    #[must_use]
    pub fn preload_categories(&self, agent: &str) -> &[String] {
        self.preload_patterns
            .get(agent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn category_matches(pattern: &str, category: &str) -> bool {
    if pattern == "*" || pattern == category {
        return true;
    }
    pattern
        .strip_suffix("/*")
        .is_some_and(|prefix| category.starts_with(prefix) && category[prefix.len()..].starts_with('/'))
}
