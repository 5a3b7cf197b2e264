//! The generated project configuration (`.skillsmith/project.yaml`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{Result, SmithError};
use crate::stack::{CompileConfig, ResolvedAgent, Stack};
use crate::utils::write_file;

/// Project-relative location of the generated configuration.
pub const PROJECT_CONFIG_FILE: &str = ".skillsmith/project.yaml";

/// A skill entry: a bare ID or an object carrying one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SkillEntry {
    Id(String),
    Detailed {
        id: String,
        #[serde(flatten)]
        extra: BTreeMap<String, Value>,
    },
}

impl SkillEntry {
    /// Identity key used for list unions.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Detailed { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub philosophy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<SkillEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hooks: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub agent_skills: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub preload_patterns: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_agents: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stack: BTreeMap<String, Value>,

    /// Fields this tool does not manage, kept as written.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProjectConfig {
    #[must_use]
    pub fn path_in(project_dir: &Path) -> PathBuf {
        project_dir.join(PROJECT_CONFIG_FILE)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|err| {
            SmithError::ValidationFailed(format!("project config parse error: {err}"))
        })
    }

    /// Load the config at `path`; `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path).map_err(|err| {
            SmithError::Config(format!("read project config {}: {err}", path.display()))
        })?;
        Self::from_yaml_str(&raw).map(Some)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        write_file(path, yaml)
    }

    /// Skill IDs in list order.
    pub fn skill_ids(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(SkillEntry::id)
    }

    /// Generate the configuration for a compile run.
    #[must_use]
    pub fn generate(
        config: &CompileConfig,
        agents: &[ResolvedAgent],
        source: &str,
        stack: Option<&Stack>,
    ) -> Self {
        let mut skills: Vec<SkillEntry> = Vec::new();
        let mut agent_skills = BTreeMap::new();
        let mut preload_patterns = BTreeMap::new();
        for agent in agents {
            let mut per_agent = Mapping::new();
            let mut preloaded = Vec::new();
            for skill in &agent.skills {
                if !skills.iter().any(|s| s.id() == skill.id) {
                    skills.push(SkillEntry::Id(skill.id.clone()));
                }
                let mut entry = Mapping::new();
                entry.insert("usage".into(), skill.usage.clone().into());
                entry.insert("preloaded".into(), skill.preloaded.into());
                per_agent.insert(skill.id.clone().into(), Value::Mapping(entry));
                if skill.preloaded {
                    preloaded.push(Value::String(skill.id.clone()));
                }
            }
            agent_skills.insert(agent.name.clone(), Value::Mapping(per_agent));
            if !preloaded.is_empty() {
                preload_patterns.insert(agent.name.clone(), Value::Sequence(preloaded));
            }
        }

        let stack_map = stack.map_or_else(BTreeMap::new, |stack| {
            stack
                .agents
                .iter()
                .map(|(agent, slots)| {
                    let mut inner = Mapping::new();
                    for (sub, list) in slots {
                        let ids: Vec<Value> =
                            list.iter().map(|a| Value::String(a.id.clone())).collect();
                        inner.insert(sub.clone().into(), Value::Sequence(ids));
                    }
                    (agent.clone(), Value::Mapping(inner))
                })
                .collect()
        });

        Self {
            name: Some(config.name.clone()),
            description: Some(config.description.clone()).filter(|d| !d.is_empty()),
            source: Some(source.to_string()),
            author: config.author.clone(),
            philosophy: stack.and_then(|s| s.philosophy.clone()),
            tags: Some(config.keywords.clone()).filter(|k| !k.is_empty()),
            skills,
            agents: agents.iter().map(|a| a.name.clone()).collect(),
            agent_skills,
            preload_patterns,
            stack: stack_map,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn skill_entries_accept_both_forms() {
        let config = ProjectConfig::from_yaml_str(
            r"
name: demo
skills:
  - react
  - { id: zustand, pinned: true }
custom_field: kept
",
        )
        .unwrap();
        let ids: Vec<_> = config.skill_ids().collect();
        assert_eq!(ids, vec!["react", "zustand"]);
        assert!(config.extra.contains_key("custom_field"));
    }

    #[test]
    fn save_then_load_preserves_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = ProjectConfig::path_in(dir.path());
        let mut config = ProjectConfig {
            name: Some("demo".into()),
            ..ProjectConfig::default()
        };
        config
            .extra
            .insert("owner".into(), Value::String("team".into()));
        config.save(&path).unwrap();
        let loaded = ProjectConfig::load(&path).unwrap().unwrap();
        assert_eq!(loaded, config);
        assert!(ProjectConfig::load(&dir.path().join("nope.yaml")).unwrap().is_none());
    }
}
