//! Stack and agent skill resolution.
//!
//! Turns a compile configuration into concrete per-agent skill lists with
//! preload placement decided. Unknown references never abort resolution:
//! they are expanded as category prefixes where possible and otherwise
//! dropped with a warning.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{AgentDefinition, Catalog, IdResolver, ResolvedSkill, load_skill_body};
use crate::error::{Result, SmithError};

use super::mappings::AgentMappings;
use super::types::{AgentSkillRef, CompileAgentConfig, CompileConfig, Stack};

/// One skill as placed in an agent.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedAgentSkill {
    pub id: String,
    pub category: String,
    pub usage: String,
    pub preloaded: bool,
    pub description: String,
    /// Markdown body without frontmatter.
    pub content: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedAgent {
    pub name: String,
    pub definition: AgentDefinition,
    pub skills: Vec<ResolvedAgentSkill>,
}

impl ResolvedAgent {
    pub fn preloaded_skills(&self) -> impl Iterator<Item = &ResolvedAgentSkill> {
        self.skills.iter().filter(|s| s.preloaded)
    }

    pub fn dynamic_skills(&self) -> impl Iterator<Item = &ResolvedAgentSkill> {
        self.skills.iter().filter(|s| !s.preloaded)
    }

    #[must_use]
    pub fn skill_ids(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.id.as_str()).collect()
    }
}

/// Default per-agent usage text for a skill.
#[must_use]
pub fn default_usage(skill: &ResolvedSkill) -> String {
    skill
        .usage_guidance
        .clone()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| format!("Use when working with {}", skill.display_name))
}

pub struct StackResolver<'a> {
    catalog: &'a Catalog,
    mappings: &'a AgentMappings,
    ids: IdResolver,
}

impl<'a> StackResolver<'a> {
    pub fn new(catalog: &'a Catalog, mappings: &'a AgentMappings) -> Self {
        Self {
            catalog,
            mappings,
            ids: IdResolver::from_catalog(catalog),
        }
    }

    /// Convert a stack into an explicit compile configuration. Every agent
    /// named by the stack gets an explicit skill list.
    #[must_use]
    pub fn stack_to_compile_config(&self, stack: &Stack) -> CompileConfig {
        let agents = stack
            .agents
            .keys()
            .map(|agent| {
                let skills = stack
                    .assignments_for(agent)
                    .map(|(_, assignment)| {
                        let id = self.ids.resolve(&assignment.id, &format!("stack `{}`", stack.id));
                        let usage = self.catalog.get(&id).map(default_usage);
                        AgentSkillRef {
                            id,
                            usage,
                            preloaded: assignment.preloaded,
                        }
                    })
                    .collect();
                (
                    agent.clone(),
                    CompileAgentConfig {
                        skills: Some(skills),
                    },
                )
            })
            .collect();

        CompileConfig {
            name: stack.id.clone(),
            description: stack.description.clone(),
            author: None,
            keywords: Vec::new(),
            stack: Some(stack.id.clone()),
            agents,
        }
    }

    /// Resolve a reference to catalog IDs: the canonical match, else every
    /// skill nested under it as a category or directory prefix.
    #[must_use]
    pub fn expand_reference(&self, reference: &str, context: &str) -> Vec<String> {
        let id = self.ids.resolve(reference, context);
        if self.catalog.contains(&id) {
            return vec![id];
        }
        let prefix = reference.trim().trim_end_matches('/');
        let nested = format!("{prefix}/");
        let expanded: Vec<String> = self
            .catalog
            .skills
            .values()
            .filter(|s| {
                s.id.starts_with(&nested)
                    || s.category == prefix
                    || s.category.starts_with(&nested)
                    || s.directory_path.starts_with(&nested)
            })
            .map(|s| s.id.clone())
            .collect();
        if expanded.is_empty() {
            warn!(reference = %reference, context = %context, "skill reference matched nothing, skipping");
        } else {
            debug!(reference = %reference, count = expanded.len(), "expanded category reference");
        }
        expanded
    }

    /// Whether a skill is preloaded for an agent by placement rules.
    ///
    /// Any preload pattern of the agent matching one of: the exact
    /// category, a substring of the skill's directory path, a substring of
    /// the lowercased ID, or a subcategory alias linking the pattern and
    /// the category.
    #[must_use]
    pub fn is_preloaded(&self, agent: &str, skill: &ResolvedSkill) -> bool {
        let patterns = self.mappings.preload_categories(agent);
        let aliases = &self.mappings.subcategory_aliases;
        let id = skill.id.to_lowercase();
        let sub_alias = aliases.get(skill.subcategory());
        patterns.iter().any(|pattern| {
            let pattern_lower = pattern.to_lowercase();
            skill.category == *pattern
                || skill.directory_path.contains(pattern.as_str())
                || id.contains(&pattern_lower)
                || aliases.get(pattern).is_some_and(|path| *path == skill.category)
                || sub_alias.is_some_and(|path| path == pattern)
        })
    }

    /// Resolve every agent in a compile configuration.
    pub fn resolve_agents(&self, config: &CompileConfig) -> Result<Vec<ResolvedAgent>> {
        config
            .agents
            .iter()
            .map(|(name, agent_config)| self.resolve_agent(name, agent_config))
            .collect()
    }

    fn resolve_agent(&self, name: &str, config: &CompileAgentConfig) -> Result<ResolvedAgent> {
        let definition = self
            .catalog
            .agents
            .get(name)
            .cloned()
            .ok_or_else(|| SmithError::NotFound(format!("agent definition `{name}`")))?;

        // (id, explicit usage, explicit preload)
        let mut selected: Vec<(String, Option<String>, bool)> = Vec::new();
        let mut seen = HashSet::new();
        match &config.skills {
            Some(refs) => {
                let context = format!("agent `{name}`'s skill list");
                for skill_ref in refs {
                    for id in self.expand_reference(&skill_ref.id, &context) {
                        if seen.insert(id.clone()) {
                            selected.push((id, skill_ref.usage.clone(), skill_ref.preloaded));
                        }
                    }
                }
            }
            None => {
                for skill in self.catalog.skills.values() {
                    if self.mappings.agent_receives(name, &skill.category)
                        && seen.insert(skill.id.clone())
                    {
                        selected.push((skill.id.clone(), None, false));
                    }
                }
            }
        }

        let mut skills = Vec::with_capacity(selected.len());
        for (id, usage, explicit_preload) in selected {
            let Some(skill) = self.catalog.get(&id) else {
                continue;
            };
            let content = match load_skill_body(&skill.path) {
                Ok(content) => content,
                Err(err) => {
                    warn!(agent = %name, skill = %id, error = %err, "skipping unreadable skill");
                    continue;
                }
            };
            skills.push(ResolvedAgentSkill {
                preloaded: explicit_preload || self.is_preloaded(name, skill),
                usage: usage.unwrap_or_else(|| default_usage(skill)),
                category: skill.category.clone(),
                description: skill.description.clone(),
                content,
                path: skill.path.clone(),
                id,
            });
        }

        debug!(agent = %name, skills = skills.len(), "resolved agent");
        Ok(ResolvedAgent {
            name: name.to_string(),
            definition,
            skills,
        })
    }
}
