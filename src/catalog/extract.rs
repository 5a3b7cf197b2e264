//! Catalog extraction from a source tree.
//!
//! Walks a source's skills and agents directories and produces flat
//! records. Per-file problems (bad frontmatter, missing fields, unknown
//! categories) never abort extraction: the offending entry is skipped,
//! logged, and reported as an [`ExtractionIssue`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SmithError};
use crate::utils::to_slash_path;

use super::rules::RelationshipRules;
use super::types::{AgentDefinition, RawSkill};

pub const SKILL_FILE: &str = "SKILL.md";
pub const SKILL_METADATA_FILE: &str = "metadata.yaml";
pub const AGENT_METADATA_FILE: &str = "metadata.yaml";
/// Category given to installed copies without metadata.
pub const LOCAL_CATEGORY: &str = "local/custom";

static FRONTMATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*---\r?\n([\s\S]*?)\r?\n---[ \t]*(?:\r?\n|$)([\s\S]*)$")
        .expect("frontmatter regex is valid")
});

/// Where a source keeps its skills, agents and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    pub root: PathBuf,
    pub skills_dir: PathBuf,
    pub agents_dir: PathBuf,
    pub rules_file: Option<PathBuf>,
    pub stacks_file: Option<PathBuf>,
    pub mappings_file: Option<PathBuf>,
}

impl SourceLayout {
    /// Probe a source root; the first existing candidate wins.
    #[must_use]
    pub fn detect(root: &Path) -> Self {
        let pick_dir = |candidates: &[&str]| {
            candidates
                .iter()
                .map(|c| root.join(c))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| root.join(candidates[0]))
        };
        let pick_file = |name: &str| {
            ["config", "src/config"]
                .iter()
                .map(|dir| root.join(dir).join(name))
                .find(|p| p.is_file())
        };
        Self {
            root: root.to_path_buf(),
            skills_dir: pick_dir(&["src/skills", "skills"]),
            agents_dir: pick_dir(&["src/agents", "agents"]),
            rules_file: pick_file("skills-matrix.yaml"),
            stacks_file: pick_file("stacks.yaml"),
            mappings_file: pick_file("agent-mappings.yaml"),
        }
    }
}

/// Per-run extraction state, built once and threaded explicitly.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    pub known_categories: BTreeSet<String>,
    pub discovered_custom_categories: BTreeSet<String>,
    pub discovered_custom_domains: BTreeSet<String>,
    pub discovered_custom_agents: BTreeSet<String>,
}

impl ExtractionContext {
    #[must_use]
    pub fn new(rules: &RelationshipRules) -> Self {
        Self {
            known_categories: rules.categories.keys().cloned().collect(),
            ..Self::default()
        }
    }

    /// Decide whether a category is acceptable, recording custom ones.
    pub fn accept_category(&mut self, category: &str, custom: bool) -> bool {
        if self.known_categories.is_empty() || self.known_categories.contains(category) {
            return true;
        }
        if custom {
            if self.discovered_custom_categories.insert(category.to_string()) {
                debug!(category = %category, "discovered custom category");
            }
            let domain = category.split('/').next().unwrap_or(category);
            self.discovered_custom_domains.insert(domain.to_string());
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionIssue {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub skills: Vec<RawSkill>,
    pub agents: Vec<AgentDefinition>,
    pub issues: Vec<ExtractionIssue>,
}

/// Options for extracting skills.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Accept skills without `metadata.yaml`, placing them in
    /// [`LOCAL_CATEGORY`]. Used for installed copies.
    pub allow_missing_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct SkillFrontmatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SkillMetadataFile {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    category_exclusive: bool,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    cli_name: Option<String>,
    #[serde(default)]
    cli_description: Option<String>,
    #[serde(default)]
    usage_guidance: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    custom: bool,
    #[serde(default)]
    forked_from: Option<String>,
    #[serde(default)]
    conflicts_with: Vec<String>,
    #[serde(default, alias = "recommends")]
    compatible_with: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    requires_setup: Vec<String>,
    #[serde(default)]
    provides_setup_for: Vec<String>,
    #[serde(default)]
    discourages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AgentMetadataFile {
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    tools: Vec<String>,
    #[serde(default)]
    custom: bool,
}

/// Split a markdown document into parsed frontmatter YAML and body.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let caps = FRONTMATTER_RE.captures(content)?;
    let yaml = caps.get(1)?.as_str();
    let body = caps.get(2).map_or("", |m| m.as_str());
    Some((yaml, body))
}

/// Read a SKILL.md and return its body without frontmatter.
pub fn load_skill_body(skill_dir: &Path) -> Result<String> {
    let file = skill_dir.join(SKILL_FILE);
    let content = std::fs::read_to_string(&file).map_err(|err| {
        SmithError::InvalidSkill(format!("read {}: {err}", file.display()))
    })?;
    Ok(split_frontmatter(&content)
        .map_or(content.as_str(), |(_, body)| body)
        .trim()
        .to_string())
}

/// Extract skills and agents from a source root.
pub fn extract_source(root: &Path, ctx: &mut ExtractionContext) -> Result<Extraction> {
    if !root.exists() {
        return Err(SmithError::NotFound(format!("source {}", root.display())));
    }
    Ok(extract_layout(&SourceLayout::detect(root), ctx))
}

/// Extract skills and agents from an already detected layout.
pub fn extract_layout(layout: &SourceLayout, ctx: &mut ExtractionContext) -> Extraction {
    let (skills, mut issues) = extract_skills(&layout.skills_dir, ctx, ExtractOptions::default());
    let (agents, agent_issues) = extract_agents(&layout.agents_dir, ctx);
    issues.extend(agent_issues);
    Extraction {
        skills,
        agents,
        issues,
    }
}

/// Extract every skill directory (one containing `SKILL.md`) under a root.
pub fn extract_skills(
    skills_root: &Path,
    ctx: &mut ExtractionContext,
    options: ExtractOptions,
) -> (Vec<RawSkill>, Vec<ExtractionIssue>) {
    let mut skills = Vec::new();
    let mut issues = Vec::new();
    if !skills_root.is_dir() {
        debug!(path = %skills_root.display(), "no skills directory");
        return (skills, issues);
    }

    let mut skill_dirs: Vec<PathBuf> = WalkDir::new(skills_root)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() == SKILL_FILE)
        .filter_map(|e| e.path().parent().map(Path::to_path_buf))
        .collect();
    skill_dirs.sort();

    for dir in skill_dirs {
        match extract_skill(skills_root, &dir, ctx, options) {
            Ok(skill) => skills.push(skill),
            Err(message) => {
                warn!(path = %dir.display(), "skipping skill: {message}");
                issues.push(ExtractionIssue { path: dir, message });
            }
        }
    }
    (skills, issues)
}

fn extract_skill(
    skills_root: &Path,
    dir: &Path,
    ctx: &mut ExtractionContext,
    options: ExtractOptions,
) -> std::result::Result<RawSkill, String> {
    let skill_file = dir.join(SKILL_FILE);
    let content = std::fs::read_to_string(&skill_file)
        .map_err(|err| format!("read {SKILL_FILE}: {err}"))?;
    let (yaml, _) = split_frontmatter(&content)
        .ok_or_else(|| format!("{SKILL_FILE} has no frontmatter"))?;
    let frontmatter: SkillFrontmatter =
        serde_yaml::from_str(yaml).map_err(|err| format!("invalid frontmatter: {err}"))?;
    let id = frontmatter
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| "frontmatter is missing `name`".to_string())?;
    let fm_description = frontmatter.description.unwrap_or_default();

    let metadata_path = dir.join(SKILL_METADATA_FILE);
    let metadata = if metadata_path.is_file() {
        let raw = std::fs::read_to_string(&metadata_path)
            .map_err(|err| format!("read {SKILL_METADATA_FILE}: {err}"))?;
        serde_yaml::from_str::<SkillMetadataFile>(&raw)
            .map_err(|err| format!("invalid {SKILL_METADATA_FILE}: {err}"))?
    } else if options.allow_missing_metadata {
        SkillMetadataFile {
            category: Some(LOCAL_CATEGORY.to_string()),
            custom: true,
            ..SkillMetadataFile::default()
        }
    } else {
        return Err(format!("missing {SKILL_METADATA_FILE}"));
    };

    let category = metadata
        .category
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| format!("{SKILL_METADATA_FILE} is missing `category`"))?;
    if !ctx.accept_category(&category, metadata.custom) {
        return Err(format!(
            "unknown category `{category}` (mark the skill `custom: true` to allow it)"
        ));
    }

    let description = metadata
        .cli_description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(fm_description);
    if description.trim().is_empty() {
        return Err("missing description".to_string());
    }

    let directory_path = dir
        .strip_prefix(skills_root)
        .map(to_slash_path)
        .unwrap_or_default();
    let display_name = metadata.cli_name.unwrap_or_else(|| {
        id.rsplit('/').next().unwrap_or(&id).to_string()
    });
    if let Some(origin) = metadata.forked_from.as_deref() {
        debug!(skill = %id, forked_from = %origin, "extracted forked skill");
    }

    Ok(RawSkill {
        id,
        directory_path,
        category,
        category_exclusive: metadata.category_exclusive,
        display_name,
        description,
        usage_guidance: metadata.usage_guidance,
        tags: metadata.tags,
        author: metadata.author,
        custom: metadata.custom,
        conflicts_with: metadata.conflicts_with,
        compatible_with: metadata.compatible_with,
        requires: metadata.requires,
        requires_setup: metadata.requires_setup,
        provides_setup_for: metadata.provides_setup_for,
        discourages: metadata.discourages,
        path: dir.to_path_buf(),
    })
}

/// Extract agent definitions (directories with `metadata.yaml`).
pub fn extract_agents(
    agents_root: &Path,
    ctx: &mut ExtractionContext,
) -> (Vec<AgentDefinition>, Vec<ExtractionIssue>) {
    let mut agents = Vec::new();
    let mut issues = Vec::new();
    if !agents_root.is_dir() {
        return (agents, issues);
    }

    let mut metadata_files: Vec<PathBuf> = WalkDir::new(agents_root)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() == AGENT_METADATA_FILE)
        .map(walkdir::DirEntry::into_path)
        .filter(|p| !p.components().any(|c| c.as_os_str() == "_templates"))
        .collect();
    metadata_files.sort();

    for file in metadata_files {
        let dir = file.parent().map_or_else(|| agents_root.to_path_buf(), Path::to_path_buf);
        let parsed = std::fs::read_to_string(&file)
            .map_err(|err| format!("read agent metadata: {err}"))
            .and_then(|raw| {
                serde_yaml::from_str::<AgentMetadataFile>(&raw)
                    .map_err(|err| format!("invalid agent metadata: {err}"))
            });
        match parsed {
            Ok(AgentMetadataFile { id: Some(id), .. }) if id.trim().is_empty() => {
                issues.push(agent_issue(dir, "agent metadata has an empty `id`"));
            }
            Ok(AgentMetadataFile { id: None, .. }) => {
                issues.push(agent_issue(dir, "agent metadata is missing `id`"));
            }
            Ok(meta) => {
                let id = meta.id.unwrap_or_default();
                if meta.custom {
                    ctx.discovered_custom_agents.insert(id.clone());
                }
                agents.push(AgentDefinition {
                    title: if meta.title.is_empty() { id.clone() } else { meta.title },
                    id,
                    description: meta.description,
                    model: meta.model,
                    tools: meta.tools,
                    custom: meta.custom,
                    path: dir,
                });
            }
            Err(message) => issues.push(agent_issue(dir, &message)),
        }
    }
    (agents, issues)
}

fn agent_issue(path: PathBuf, message: &str) -> ExtractionIssue {
    warn!(path = %path.display(), "skipping agent: {message}");
    ExtractionIssue {
        path,
        message: message.to_string(),
    }
}

/// Collect only the IDs of skills under a directory (frontmatter `name`).
pub fn extract_skill_ids(skills_root: &Path) -> Vec<(String, PathBuf)> {
    let mut ctx = ExtractionContext::default();
    let options = ExtractOptions {
        allow_missing_metadata: true,
    };
    extract_skills(skills_root, &mut ctx, options)
        .0
        .into_iter()
        .map(|s| (s.id, s.path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::write_file;

    fn ctx() -> ExtractionContext {
        ExtractionContext::new(&RelationshipRules::builtin().unwrap())
    }

    fn write_skill(root: &Path, dir: &str, name: &str, metadata: &str) {
        write_file(
            root.join(dir).join(SKILL_FILE),
            format!("---\nname: {name}\ndescription: About {name}\n---\n\n# {name}\n\nBody text.\n"),
        )
        .unwrap();
        if !metadata.is_empty() {
            write_file(root.join(dir).join(SKILL_METADATA_FILE), metadata).unwrap();
        }
    }

    #[test]
    fn frontmatter_split() {
        let (yaml, body) = split_frontmatter("---\nname: a\n---\nhello\n").unwrap();
        assert_eq!(yaml, "name: a");
        assert_eq!(body, "hello\n");
        assert!(split_frontmatter("no frontmatter").is_none());
    }

    #[test]
    fn extracts_skill_with_relations() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(
            dir.path(),
            "web/framework/react",
            "web-framework-react",
            "category: web/framework\nauthor: '@acme'\ntags: [ui]\nconflicts_with: [vue]\nrecommends: [zustand]\nrequires: [typescript]\n",
        );

        let (skills, issues) = extract_skills(dir.path(), &mut ctx(), ExtractOptions::default());
        assert!(issues.is_empty(), "{issues:?}");
        let skill = &skills[0];
        assert_eq!(skill.id, "web-framework-react");
        assert_eq!(skill.directory_path, "web/framework/react");
        assert_eq!(skill.category, "web/framework");
        assert_eq!(skill.description, "About web-framework-react");
        assert_eq!(skill.conflicts_with, vec!["vue"]);
        assert_eq!(skill.compatible_with, vec!["zustand"]);
        assert_eq!(skill.requires, vec!["typescript"]);
        assert_eq!(skill.author.as_deref(), Some("@acme"));
    }

    #[test]
    fn unknown_category_is_skipped_unless_custom() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(dir.path(), "a", "skill-a", "category: made/up\n");
        write_skill(dir.path(), "b", "skill-b", "category: acme/internal\ncustom: true\n");

        let mut context = ctx();
        let (skills, issues) = extract_skills(dir.path(), &mut context, ExtractOptions::default());
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].id, "skill-b");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("unknown category"));
        assert!(context.discovered_custom_categories.contains("acme/internal"));
        assert!(context.discovered_custom_domains.contains("acme"));
    }

    #[test]
    fn missing_metadata_is_an_issue_for_catalog_sources() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(dir.path(), "lonely", "lonely", "");

        let (skills, issues) = extract_skills(dir.path(), &mut ctx(), ExtractOptions::default());
        assert!(skills.is_empty());
        assert!(issues[0].message.contains("missing metadata.yaml"));

        let (skills, _) = extract_skills(
            dir.path(),
            &mut ctx(),
            ExtractOptions {
                allow_missing_metadata: true,
            },
        );
        assert_eq!(skills[0].category, LOCAL_CATEGORY);
        assert!(skills[0].custom);
    }

    #[test]
    fn invalid_frontmatter_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path().join("bad").join(SKILL_FILE), "---\nname: [\n---\n").unwrap();
        let (skills, issues) = extract_skills(dir.path(), &mut ctx(), ExtractOptions::default());
        assert!(skills.is_empty());
        assert!(issues[0].message.contains("invalid frontmatter"));
    }

    #[test]
    fn extracts_agents_and_skips_templates() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("developer/web-developer").join(AGENT_METADATA_FILE),
            "id: web-developer\ntitle: Web Developer\ndescription: Builds UI\ntools: [Read, Write]\n",
        )
        .unwrap();
        write_file(
            dir.path().join("_templates").join(AGENT_METADATA_FILE),
            "id: template\n",
        )
        .unwrap();
        write_file(dir.path().join("broken").join(AGENT_METADATA_FILE), "title: x\n").unwrap();

        let mut context = ctx();
        let (agents, issues) = extract_agents(dir.path(), &mut context);
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id, "web-developer");
        assert_eq!(agents[0].tools, vec!["Read", "Write"]);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn missing_source_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_source(&dir.path().join("nope"), &mut ctx()).unwrap_err();
        assert!(matches!(err, SmithError::NotFound(_)));
    }

    #[test]
    fn skill_body_strips_frontmatter() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(dir.path(), "s", "s", "category: web/testing\n");
        let body = load_skill_body(&dir.path().join("s")).unwrap();
        assert!(body.starts_with("# s"));
        assert!(!body.contains("description:"));
    }
}
