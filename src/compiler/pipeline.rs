//! Compile orchestration: resolve agents, render them, version the plugin,
//! then write the project config, agents, skills and manifest.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{SelectionIssue, validate_selection};
use crate::error::{Result, SmithError};
use crate::project::{ProjectConfig, merge_with_existing};
use crate::sources::LoadedCatalog;
use crate::stack::{CompileConfig, ResolvedAgent, Stack, StackResolver};
use crate::utils::{copy_dir_all, write_file};

use super::fragments::AgentFragments;
use super::manifest::{PluginAuthor, PluginManifest};
use super::render::{AGENT_TEMPLATE, AgentTemplateData, TemplateRenderer};
use super::versioning::{VersionDecision, content_hash, next_version};

pub const AGENTS_OUTPUT_DIR: &str = "agents";
pub const SKILLS_OUTPUT_DIR: &str = "skills";

/// What to compile.
#[derive(Debug, Clone)]
pub enum CompileInput {
    /// A stack ID from the primary source's `stacks.yaml`.
    Stack(String),
    Config(CompileConfig),
}

pub struct CompileRequest<'a> {
    pub loaded: &'a LoadedCatalog,
    pub input: CompileInput,
    pub project_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Used when the compile config names no author.
    pub author: Option<String>,
    /// Used when the compile config lists no keywords.
    pub keywords: Vec<String>,
    pub renderer: &'a dyn TemplateRenderer,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub file: PathBuf,
    pub preloaded: Vec<String>,
    pub dynamic: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    pub name: String,
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub project_config_path: PathBuf,
    pub merged_existing_config: bool,
    pub content_hash: String,
    pub version: VersionDecision,
    pub agents: Vec<AgentSummary>,
    pub skill_dirs: Vec<PathBuf>,
    pub warnings: Vec<SelectionIssue>,
}

pub fn compile_project(request: &CompileRequest<'_>) -> Result<CompileReport> {
    let loaded = request.loaded;
    let catalog = &loaded.catalog;
    let resolver = StackResolver::new(catalog, &loaded.mappings);

    let (config, stack): (CompileConfig, Option<&Stack>) = match &request.input {
        CompileInput::Stack(id) => {
            let stack = loaded
                .stack(id)
                .ok_or_else(|| SmithError::NotFound(format!("stack `{id}`")))?;
            (resolver.stack_to_compile_config(stack), Some(stack))
        }
        CompileInput::Config(config) => (config.clone(), None),
    };
    let keywords = if config.keywords.is_empty() {
        request.keywords.clone()
    } else {
        config.keywords.clone()
    };
    let config = CompileConfig {
        author: config.author.clone().or_else(|| request.author.clone()),
        keywords,
        ..config
    };
    info!(name = %config.name, agents = config.agents.len(), "compiling");

    let agents = resolver.resolve_agents(&config)?;
    let warnings = check_selections(loaded, &agents);

    // Everything that can fail is settled before the first write.
    let generated = ProjectConfig::generate(&config, &agents, &loaded.primary.url, stack);
    let outcome = merge_with_existing(&generated, &request.project_dir)?;
    let project_config_path = ProjectConfig::path_in(&request.project_dir);

    let output_dir = request.output_dir.as_path();
    let mut rendered_agents = Vec::with_capacity(agents.len());
    for agent in &agents {
        let fragments = AgentFragments::load(&agent.definition, &loaded.layout.agents_dir)?;
        let data = AgentTemplateData::new(agent, fragments);
        let rendered = request.renderer.render(AGENT_TEMPLATE, &data)?;
        rendered_agents.push((agent, rendered));
    }
    check_skill_dirs(&agents)?;

    let hash = content_hash(
        generated.name.as_deref().unwrap_or_default(),
        generated.description.as_deref().unwrap_or_default(),
        generated.skill_ids(),
        generated.agents.iter().map(String::as_str),
    );
    let prior = PluginManifest::load(output_dir)?;
    let version = next_version(
        prior
            .as_ref()
            .map(|m| (m.version.as_str(), m.content_hash.as_deref())),
        &hash,
    )?;
    match &version {
        VersionDecision::MajorBump { from, version } => {
            info!(from = %from, to = %version, "content changed, bumping major version");
        }
        VersionDecision::Unchanged { version } => info!(version = %version, "content unchanged"),
        VersionDecision::Initial { version } => info!(version = %version, "initial version"),
    }

    outcome.config.save(&project_config_path)?;
    reset_dir(&output_dir.join(AGENTS_OUTPUT_DIR))?;
    reset_dir(&output_dir.join(SKILLS_OUTPUT_DIR))?;

    let mut summaries = Vec::with_capacity(rendered_agents.len());
    for (agent, rendered) in rendered_agents {
        let file = output_dir
            .join(AGENTS_OUTPUT_DIR)
            .join(format!("{}.md", agent.name));
        write_file(&file, rendered)?;
        summaries.push(AgentSummary {
            name: agent.name.clone(),
            file,
            preloaded: agent.preloaded_skills().map(|s| s.id.clone()).collect(),
            dynamic: agent.dynamic_skills().map(|s| s.id.clone()).collect(),
        });
    }

    let skill_dirs = bundle_skills(&agents, output_dir)?;

    let manifest = PluginManifest {
        name: config.name.clone(),
        version: version.version().to_string(),
        description: config.description.clone(),
        author: config.author.clone().map(|name| PluginAuthor { name, email: None }),
        keywords: config.keywords.clone(),
        content_hash: Some(hash.clone()),
    };
    let manifest_path = manifest.write(output_dir)?;

    Ok(CompileReport {
        name: config.name,
        output_dir: output_dir.to_path_buf(),
        manifest_path,
        project_config_path,
        merged_existing_config: outcome.merged,
        content_hash: hash,
        version,
        agents: summaries,
        skill_dirs,
        warnings,
    })
}

/// Validate each agent's final skill set. Problems are logged, never fatal.
fn check_selections(loaded: &LoadedCatalog, agents: &[ResolvedAgent]) -> Vec<SelectionIssue> {
    let mut issues = Vec::new();
    for agent in agents {
        let ids: Vec<String> = agent.skills.iter().map(|s| s.id.clone()).collect();
        let report = validate_selection(&loaded.catalog, &ids);
        for issue in report.errors.into_iter().chain(report.warnings) {
            warn!(agent = %agent.name, kind = ?issue.kind, "{}", issue.message);
            issues.push(issue);
        }
    }
    issues
}

/// Every selected skill must have a directory to bundle.
fn check_skill_dirs(agents: &[ResolvedAgent]) -> Result<()> {
    for skill in agents.iter().flat_map(|a| &a.skills) {
        if !skill.path.is_dir() {
            return Err(SmithError::NotFound(format!(
                "skill `{}` at {}",
                skill.id,
                skill.path.display()
            )));
        }
    }
    Ok(())
}

/// Copy each selected skill's active-source directory into the output.
fn bundle_skills(agents: &[ResolvedAgent], output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut seen = BTreeSet::new();
    let mut dirs = Vec::new();
    for skill in agents.iter().flat_map(|a| &a.skills) {
        if !seen.insert(skill.id.as_str()) {
            continue;
        }
        let target = output_dir
            .join(SKILLS_OUTPUT_DIR)
            .join(bundle_dir_name(&skill.id));
        copy_dir_all(&skill.path, &target)?;
        dirs.push(target);
    }
    Ok(dirs)
}

fn reset_dir(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path)?;
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Directory name for a bundled skill: the ID lowercased with every run
/// of other characters collapsed to `-`.
#[must_use]
pub fn bundle_dir_name(id: &str) -> String {
    let lowered = id.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_dash = false;

    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            out.push('-');
            last_was_dash = true;
        }
    }

    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_names_are_sanitized() {
        assert_eq!(bundle_dir_name("web/framework/react (@acme)"), "web-framework-react-acme");
        assert_eq!(bundle_dir_name("pkg-framework-react"), "pkg-framework-react");
    }
}
