//! Catalog loading across the primary source, extra sources and the
//! project's installed copies.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::catalog::extract::{SKILL_METADATA_FILE, extract_skill_ids};
use crate::catalog::{
    AgentDefinition, Catalog, ExtractOptions, Extraction, ExtractionContext, ExtractionIssue,
    RawSkill, RelationshipRules, SourceLayout, build_catalog, extract_layout, extract_skills,
    extract_source,
};
use crate::error::Result;
use crate::stack::{AgentMappings, Stack, load_stacks};

use super::descriptor::{DEFAULT_SOURCE_URL, SourceDescriptor, SourceType};
use super::fetch::{FetchOptions, SourceFetcher};
use super::marketplace::MarketplaceFetcher;
use super::precedence::{
    SourceCatalog, precedence_rank, resolve_source_name, should_check_public, tag_catalog,
};

/// Project-relative directory holding locally installed skills.
pub const LOCAL_SKILLS_DIR: &str = ".claude/skills";
/// Project-relative directory holding installed plugins.
pub const PLUGINS_DIR: &str = ".claude/plugins";

/// An additional source, optionally with an explicit display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraSource {
    pub name: Option<String>,
    pub url: String,
}

impl ExtraSource {
    /// Parse `name=url` or a bare URL.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.split_once('=') {
            Some((name, url)) if !name.contains('/') && !name.contains(':') => Self {
                name: Some(name.trim().to_string()),
                url: url.trim().to_string(),
            },
            _ => Self {
                name: None,
                url: value.trim().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub primary: String,
    /// Explicit display name for the primary source.
    pub marketplace_name: Option<String>,
    pub extras: Vec<ExtraSource>,
    pub project_dir: Option<PathBuf>,
    pub force_refresh: bool,
}

/// Everything the downstream pipeline needs from a load.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub primary: SourceDescriptor,
    pub layout: SourceLayout,
    pub rules: RelationshipRules,
    pub stacks: Vec<Stack>,
    pub mappings: AgentMappings,
    pub issues: Vec<ExtractionIssue>,
}

impl LoadedCatalog {
    #[must_use]
    pub fn stack(&self, id: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.id == id)
    }
}

/// Accumulates records from every source.
///
/// The first record per ID wins, except that a record from a
/// higher-precedence source carrying its own `metadata.yaml` replaces it.
/// A replacement keeps the original directory path so references by path
/// still resolve.
#[derive(Default)]
struct BuildSet {
    skills: Vec<RawSkill>,
    agents: Vec<AgentDefinition>,
    /// Skill ID to (index in `skills`, rank of the source it came from).
    skill_slots: HashMap<String, (usize, u8)>,
    agent_ids: HashSet<String>,
    issues: Vec<ExtractionIssue>,
}

impl BuildSet {
    /// Add records and return the source's ID to path table.
    fn absorb(&mut self, descriptor: SourceDescriptor, extraction: Extraction) -> SourceCatalog {
        let rank = precedence_rank(&descriptor);
        let mut source = SourceCatalog::new(descriptor);
        for mut skill in extraction.skills {
            source.skills.insert(skill.id.clone(), skill.path.clone());
            match self.skill_slots.get_mut(&skill.id) {
                None => {
                    self.skill_slots
                        .insert(skill.id.clone(), (self.skills.len(), rank));
                    self.skills.push(skill);
                }
                Some((index, current_rank))
                    if rank < *current_rank && has_own_metadata(&skill) =>
                {
                    debug!(
                        skill = %skill.id,
                        source = %source.descriptor.name,
                        "installed copy replaces skill metadata"
                    );
                    let existing = &mut self.skills[*index];
                    skill.directory_path = std::mem::take(&mut existing.directory_path);
                    *existing = skill;
                    *current_rank = rank;
                }
                Some(_) => {}
            }
        }
        for agent in extraction.agents {
            if self.agent_ids.insert(agent.id.clone()) {
                self.agents.push(agent);
            }
        }
        self.issues.extend(extraction.issues);
        source
    }
}

fn has_own_metadata(skill: &RawSkill) -> bool {
    skill.path.join(SKILL_METADATA_FILE).is_file()
}

pub struct CatalogLoader<'a> {
    fetcher: &'a dyn SourceFetcher,
    marketplace: &'a dyn MarketplaceFetcher,
}

impl<'a> CatalogLoader<'a> {
    pub fn new(fetcher: &'a dyn SourceFetcher, marketplace: &'a dyn MarketplaceFetcher) -> Self {
        Self {
            fetcher,
            marketplace,
        }
    }

    pub fn load(&self, options: &LoadOptions) -> Result<LoadedCatalog> {
        let fetch_options = FetchOptions {
            force_refresh: options.force_refresh,
        };

        // Primary source: any failure aborts.
        let fetched = self.fetcher.fetch(&options.primary, &fetch_options)?;
        let layout = SourceLayout::detect(&fetched.path);
        let mut rules = RelationshipRules::builtin()?;
        if let Some(file) = &layout.rules_file {
            rules = rules.merge(RelationshipRules::load(file)?);
        }
        let mut ctx = ExtractionContext::new(&rules);

        let primary_name = resolve_source_name(
            &options.primary,
            options.marketplace_name.as_deref(),
            Some(self.marketplace),
        );
        let primary = SourceDescriptor::primary(primary_name, options.primary.clone());
        info!(source = %primary.name, path = %fetched.path.display(), "loading primary source");

        let mut build = BuildSet::default();
        let mut sources = Vec::new();

        let extraction = extract_layout(&layout, &mut ctx);
        sources.push(build.absorb(primary.clone(), extraction));

        for extra in &options.extras {
            match self.load_extra(extra, &fetch_options, &mut ctx) {
                Ok((descriptor, extraction)) => {
                    debug!(source = %descriptor.name, skills = extraction.skills.len(), "loaded extra source");
                    sources.push(build.absorb(descriptor, extraction));
                }
                Err(err) => {
                    warn!(source = %extra.url, error = %err, "skipping extra source");
                }
            }
        }

        if should_check_public(&options.primary) {
            match self.check_public(&fetch_options) {
                Ok(public) => sources.push(public),
                Err(err) => {
                    warn!(source = DEFAULT_SOURCE_URL, error = %err, "public source check failed");
                }
            }
        }

        if let Some(project_dir) = &options.project_dir {
            for (descriptor, extraction) in
                installed_sources(project_dir, primary.source_type, &mut ctx)
            {
                sources.push(build.absorb(descriptor, extraction));
            }
        }

        let mut catalog = build_catalog(build.skills, build.agents, &rules, &ctx);
        tag_catalog(&mut catalog, &sources);

        let stacks = match &layout.stacks_file {
            Some(file) => load_stacks(file)?,
            None => Vec::new(),
        };
        let mappings = match &layout.mappings_file {
            Some(file) => AgentMappings::load(file)?,
            None => AgentMappings::builtin()?,
        };

        info!(
            skills = catalog.skills.len(),
            sources = sources.len(),
            issues = build.issues.len(),
            "catalog loaded"
        );
        Ok(LoadedCatalog {
            catalog,
            primary,
            layout,
            rules,
            stacks,
            mappings,
            issues: build.issues,
        })
    }

    fn load_extra(
        &self,
        extra: &ExtraSource,
        fetch_options: &FetchOptions,
        ctx: &mut ExtractionContext,
    ) -> Result<(SourceDescriptor, Extraction)> {
        let fetched = self.fetcher.fetch(&extra.url, fetch_options)?;
        let extraction = extract_source(&fetched.path, ctx)?;
        let name = resolve_source_name(&extra.url, extra.name.as_deref(), Some(self.marketplace));
        Ok((SourceDescriptor::extra(name, extra.url.clone()), extraction))
    }

    /// Check the default public source for availability only; its skills
    /// are never added to the build set.
    fn check_public(&self, fetch_options: &FetchOptions) -> Result<SourceCatalog> {
        let fetched = self.fetcher.fetch(DEFAULT_SOURCE_URL, fetch_options)?;
        let layout = SourceLayout::detect(&fetched.path);
        let mut source = SourceCatalog::new(SourceDescriptor::public_fallback());
        source.skills.extend(extract_skill_ids(&layout.skills_dir));
        Ok(source)
    }
}

/// Local overrides and installed plugins under a project directory.
///
/// Plugins carry the primary source's visibility: they are installed from
/// the marketplace being compiled against.
fn installed_sources(
    project_dir: &Path,
    plugin_type: SourceType,
    ctx: &mut ExtractionContext,
) -> Vec<(SourceDescriptor, Extraction)> {
    let options = ExtractOptions {
        allow_missing_metadata: true,
    };
    let mut out = Vec::new();

    let local_dir = project_dir.join(LOCAL_SKILLS_DIR);
    if local_dir.is_dir() {
        let (skills, issues) = extract_skills(&local_dir, ctx, options);
        debug!(path = %local_dir.display(), skills = skills.len(), "local overrides");
        out.push((
            SourceDescriptor::local_install(local_dir.to_string_lossy()),
            installed_extraction(skills, issues),
        ));
    }

    let plugins_dir = project_dir.join(PLUGINS_DIR);
    let Ok(entries) = std::fs::read_dir(&plugins_dir) else {
        return out;
    };
    let mut plugin_dirs: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| p.join("skills").is_dir())
        .collect();
    plugin_dirs.sort();
    for dir in plugin_dirs {
        let name = dir
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        let (skills, issues) = extract_skills(&dir.join("skills"), ctx, options);
        debug!(plugin = %name, skills = skills.len(), "installed plugin");
        out.push((
            SourceDescriptor::plugin_install(name, dir.to_string_lossy(), plugin_type),
            installed_extraction(skills, issues),
        ));
    }
    out
}

fn installed_extraction(skills: Vec<RawSkill>, issues: Vec<ExtractionIssue>) -> Extraction {
    Extraction {
        skills,
        agents: Vec::new(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SmithError;
    use crate::sources::fetch::FetchedSource;
    use crate::sources::marketplace::SourceMarketplaceFetcher;
    use crate::test_utils::fixtures::SourceFixture;
    use crate::test_utils::logging::capture_logs;

    const ACME: &str = "github:acme/skills";

    /// Serves remote source strings from fixture directories.
    struct FixtureFetcher {
        sources: HashMap<String, PathBuf>,
    }

    impl FixtureFetcher {
        fn new(sources: &[(&str, &SourceFixture)]) -> Self {
            Self {
                sources: sources
                    .iter()
                    .map(|(url, fixture)| ((*url).to_string(), fixture.path().to_path_buf()))
                    .collect(),
            }
        }
    }

    impl SourceFetcher for FixtureFetcher {
        fn fetch(&self, source: &str, _options: &FetchOptions) -> Result<FetchedSource> {
            self.sources
                .get(source)
                .map(|path| FetchedSource {
                    path: path.clone(),
                    from_cache: true,
                })
                .ok_or_else(|| SmithError::SourceFetch {
                    source_url: source.to_string(),
                    message: "could not resolve host".to_string(),
                })
        }
    }

    fn acme_source() -> SourceFixture {
        let source = SourceFixture::new();
        source.add_skill("vitest", "web-testing-vitest", "category: web/testing\n");
        source
    }

    fn public_source() -> SourceFixture {
        let source = SourceFixture::new();
        source.add_skill("vitest", "web-testing-vitest", "category: web/testing\n");
        source.add_skill("playwright", "web-testing-playwright", "category: web/testing\n");
        source
    }

    fn load_from(fetcher: &FixtureFetcher, primary: &str) -> Result<LoadedCatalog> {
        let marketplace = SourceMarketplaceFetcher::new(fetcher);
        CatalogLoader::new(fetcher, &marketplace).load(&LoadOptions {
            primary: primary.to_string(),
            ..LoadOptions::default()
        })
    }

    fn source_names(loaded: &LoadedCatalog, id: &str) -> Vec<String> {
        loaded
            .catalog
            .get(id)
            .unwrap()
            .available_sources
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    #[test]
    fn extra_source_parsing() {
        assert_eq!(
            ExtraSource::parse("acme=github:acme/skills"),
            ExtraSource {
                name: Some("acme".into()),
                url: "github:acme/skills".into()
            }
        );
        assert_eq!(ExtraSource::parse("https://host/x?a=b").name, None);
        assert_eq!(ExtraSource::parse("./skills").name, None);
    }

    #[test]
    fn custom_remote_primary_gets_public_availability() {
        let acme = acme_source();
        let public = public_source();
        let fetcher = FixtureFetcher::new(&[(ACME, &acme), (DEFAULT_SOURCE_URL, &public)]);

        let loaded = load_from(&fetcher, ACME).unwrap();

        assert_eq!(source_names(&loaded, "web-testing-vitest"), vec!["acme", "public"]);
        let vitest = loaded.catalog.get("web-testing-vitest").unwrap();
        let active = vitest.active_source.as_ref().unwrap();
        assert!(active.primary);
        assert!(vitest.path.starts_with(acme.path()));
        // Public-only skills never join the catalog.
        assert!(loaded.catalog.get("web-testing-playwright").is_none());
    }

    #[test]
    fn failed_public_check_only_warns() {
        let acme = acme_source();
        let fetcher = FixtureFetcher::new(&[(ACME, &acme)]);

        let (loaded, logs) = capture_logs(|| load_from(&fetcher, ACME));

        let loaded = loaded.unwrap();
        assert_eq!(source_names(&loaded, "web-testing-vitest"), vec!["acme"]);
        let warning = logs
            .warnings()
            .into_iter()
            .find(|e| e.message.contains("public source check failed"))
            .expect("check failure is logged");
        assert_eq!(warning.field("source"), Some(DEFAULT_SOURCE_URL));
    }

    #[test]
    fn default_primary_is_tagged_once() {
        let public = public_source();
        let fetcher = FixtureFetcher::new(&[(DEFAULT_SOURCE_URL, &public)]);

        let loaded = load_from(&fetcher, DEFAULT_SOURCE_URL).unwrap();

        assert_eq!(loaded.catalog.skills.len(), 2);
        for skill in loaded.catalog.skills.values() {
            assert_eq!(skill.available_sources.len(), 1, "{}", skill.id);
            assert!(skill.available_sources[0].primary);
        }
    }
}
