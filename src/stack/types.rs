//! Stacks and compile configurations.
//!
//! Assignments accept either a bare ID or an object form on disk. Both are
//! normalized to [`AnnotatedAssignment`] during deserialization, so nothing
//! downstream inspects the original shape.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SmithError};

/// An assignment as written in YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillAssignment {
    Bare(String),
    Annotated {
        id: String,
        #[serde(default)]
        preloaded: bool,
    },
}

/// The normalized assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "SkillAssignment")]
pub struct AnnotatedAssignment {
    pub id: String,
    pub preloaded: bool,
}

impl From<SkillAssignment> for AnnotatedAssignment {
    fn from(value: SkillAssignment) -> Self {
        match value {
            SkillAssignment::Bare(id) => Self {
                id,
                preloaded: false,
            },
            SkillAssignment::Annotated { id, preloaded } => Self { id, preloaded },
        }
    }
}

/// One subcategory slot: a single assignment or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AssignmentSlot {
    Many(Vec<AnnotatedAssignment>),
    One(AnnotatedAssignment),
}

fn deserialize_agents<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, BTreeMap<String, Vec<AnnotatedAssignment>>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: BTreeMap<String, BTreeMap<String, AssignmentSlot>> =
        BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(agent, slots)| {
            let slots = slots
                .into_iter()
                .map(|(subcategory, slot)| {
                    let list = match slot {
                        AssignmentSlot::Many(list) => list,
                        AssignmentSlot::One(one) => vec![one],
                    };
                    (subcategory, list)
                })
                .collect();
            (agent, slots)
        })
        .collect())
}

/// A named mapping of agent to subcategory to skill assignments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stack {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub philosophy: Option<String>,
    #[serde(default, deserialize_with = "deserialize_agents")]
    pub agents: BTreeMap<String, BTreeMap<String, Vec<AnnotatedAssignment>>>,
}

impl Stack {
    /// Every assignment for an agent, in subcategory order.
    pub fn assignments_for<'a>(
        &'a self,
        agent: &str,
    ) -> impl Iterator<Item = (&'a str, &'a AnnotatedAssignment)> + 'a {
        self.agents
            .get(agent)
            .into_iter()
            .flat_map(|slots| {
                slots
                    .iter()
                    .flat_map(|(sub, list)| list.iter().map(move |a| (sub.as_str(), a)))
            })
    }
}

#[derive(Debug, Deserialize)]
struct StacksFile {
    #[serde(default)]
    stacks: Vec<Stack>,
}

pub fn parse_stacks(input: &str) -> Result<Vec<Stack>> {
    let file: StacksFile = serde_yaml::from_str(input)
        .map_err(|err| SmithError::ValidationFailed(format!("stacks YAML parse error: {err}")))?;
    Ok(file.stacks)
}

pub fn load_stacks(path: &Path) -> Result<Vec<Stack>> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| SmithError::Config(format!("read stacks {}: {err}", path.display())))?;
    parse_stacks(&content)
}

/// A skill reference in a compile config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "AgentSkillRefRepr")]
pub struct AgentSkillRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    pub preloaded: bool,
}

impl AgentSkillRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            usage: None,
            preloaded: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AgentSkillRefRepr {
    Bare(String),
    Detailed {
        id: String,
        #[serde(default)]
        usage: Option<String>,
        #[serde(default)]
        preloaded: bool,
    },
}

impl From<AgentSkillRefRepr> for AgentSkillRef {
    fn from(value: AgentSkillRefRepr) -> Self {
        match value {
            AgentSkillRefRepr::Bare(id) => Self::new(id),
            AgentSkillRefRepr::Detailed {
                id,
                usage,
                preloaded,
            } => Self {
                id,
                usage,
                preloaded,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompileAgentConfig {
    /// Explicit skill list. When present it replaces the default
    /// category-based assignment for the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<AgentSkillRef>>,
}

/// What to compile: plugin identity plus per-agent skill lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompileConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Stack this config was derived from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default)]
    pub agents: BTreeMap<String, CompileAgentConfig>,
}

impl CompileConfig {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(input).map_err(|err| {
            SmithError::ValidationFailed(format!("compile config parse error: {err}"))
        })?;
        if config.name.trim().is_empty() {
            return Err(SmithError::ValidationFailed(
                "compile config is missing `name`".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            SmithError::NotFound(format!("compile config {}: {err}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }
}
