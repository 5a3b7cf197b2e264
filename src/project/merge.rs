//! Merging a generated project configuration into an existing one.
//!
//! Existing values win: scalars keep the existing value when present,
//! lists are unioned with existing elements first, and per-agent maps are
//! merged key by key with the existing entry winning. Neither input is
//! modified.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, info};

use crate::error::Result;

use super::config::ProjectConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub config: ProjectConfig,
    /// Whether an existing configuration was found and merged.
    pub merged: bool,
    pub existing_path: Option<PathBuf>,
}

/// Merge `incoming` into `existing`, returning a new configuration.
#[must_use]
pub fn merge_configs(incoming: &ProjectConfig, existing: &ProjectConfig) -> ProjectConfig {
    let mut skills = existing.skills.clone();
    for entry in &incoming.skills {
        if !skills.iter().any(|s| s.id() == entry.id()) {
            skills.push(entry.clone());
        }
    }
    let mut agents = existing.agents.clone();
    for agent in &incoming.agents {
        if !agents.contains(agent) {
            agents.push(agent.clone());
        }
    }

    let mut extra = incoming.extra.clone();
    extra.extend(existing.extra.clone());

    ProjectConfig {
        name: prefer(&existing.name, &incoming.name),
        description: prefer(&existing.description, &incoming.description),
        source: prefer(&existing.source, &incoming.source),
        author: prefer(&existing.author, &incoming.author),
        marketplace: prefer(&existing.marketplace, &incoming.marketplace),
        framework: prefer(&existing.framework, &incoming.framework),
        philosophy: prefer(&existing.philosophy, &incoming.philosophy),
        principles: prefer(&existing.principles, &incoming.principles),
        tags: prefer(&existing.tags, &incoming.tags),
        skills,
        agents,
        hooks: merge_agent_maps(&incoming.hooks, &existing.hooks),
        agent_skills: merge_agent_maps(&incoming.agent_skills, &existing.agent_skills),
        preload_patterns: merge_agent_maps(&incoming.preload_patterns, &existing.preload_patterns),
        custom_agents: merge_agent_maps(&incoming.custom_agents, &existing.custom_agents),
        stack: merge_agent_maps(&incoming.stack, &existing.stack),
        extra,
    }
}

/// Merge with the configuration stored under `project_dir`, if any.
pub fn merge_with_existing(incoming: &ProjectConfig, project_dir: &Path) -> Result<MergeOutcome> {
    let path = ProjectConfig::path_in(project_dir);
    match ProjectConfig::load(&path)? {
        Some(existing) => {
            info!(path = %path.display(), "merging with existing project config");
            Ok(MergeOutcome {
                config: merge_configs(incoming, &existing),
                merged: true,
                existing_path: Some(path),
            })
        }
        None => {
            debug!(path = %path.display(), "no existing project config");
            Ok(MergeOutcome {
                config: incoming.clone(),
                merged: false,
                existing_path: None,
            })
        }
    }
}

fn prefer<T: Clone>(existing: &Option<T>, incoming: &Option<T>) -> Option<T> {
    existing.clone().or_else(|| incoming.clone())
}

fn merge_agent_maps(
    incoming: &BTreeMap<String, Value>,
    existing: &BTreeMap<String, Value>,
) -> BTreeMap<String, Value> {
    let mut merged = existing.clone();
    for (agent, value) in incoming {
        let combined = match merged.get(agent) {
            Some(current) => merge_inner(value, current),
            None => value.clone(),
        };
        merged.insert(agent.clone(), combined);
    }
    merged
}

/// Key-by-key merge of one agent's entry. Non-map values keep the
/// existing entry whole.
fn merge_inner(incoming: &Value, existing: &Value) -> Value {
    match (incoming, existing) {
        (Value::Mapping(new), Value::Mapping(old)) => {
            let mut out = old.clone();
            for (key, value) in new {
                if !out.contains_key(key) {
                    out.insert(key.clone(), value.clone());
                }
            }
            Value::Mapping(out)
        }
        _ => existing.clone(),
    }
}
