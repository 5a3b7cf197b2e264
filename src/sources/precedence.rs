//! Multi-source tagging and active-source selection.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use crate::catalog::Catalog;

use super::descriptor::{DEFAULT_SOURCE_URL, SourceDescriptor, is_local_source};
use super::marketplace::MarketplaceFetcher;

/// Rank of a descriptor; lower wins.
///
/// local project override > installed plugin > other installed source >
/// primary source > extra source.
#[must_use]
pub fn precedence_rank(source: &SourceDescriptor) -> u8 {
    if source.is_local_override() {
        0
    } else if source.is_installed_plugin() {
        1
    } else if source.installed {
        2
    } else if source.primary {
        3
    } else {
        4
    }
}

/// Index of the active source. Equal ranks keep the earliest descriptor,
/// so the first-listed extra source wins over later ones.
#[must_use]
pub fn select_active(sources: &[SourceDescriptor]) -> Option<usize> {
    sources
        .iter()
        .enumerate()
        .min_by_key(|(_, s)| precedence_rank(s))
        .map(|(i, _)| i)
}

/// The skills one source provides, keyed by canonical ID.
#[derive(Debug, Clone)]
pub struct SourceCatalog {
    pub descriptor: SourceDescriptor,
    pub skills: BTreeMap<String, PathBuf>,
}

impl SourceCatalog {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        Self {
            descriptor,
            skills: BTreeMap::new(),
        }
    }
}

/// Attach one descriptor per source containing each skill and choose the
/// active source. `sources` must be in discovery order (primary, extras,
/// then installed copies). The skill's `path` follows the active source.
pub fn tag_catalog(catalog: &mut Catalog, sources: &[SourceCatalog]) {
    for skill in catalog.skills.values_mut() {
        let mut available = Vec::new();
        let mut paths = Vec::new();
        for source in sources {
            if available.iter().any(|d: &SourceDescriptor| d == &source.descriptor) {
                continue;
            }
            if let Some(path) = source.skills.get(&skill.id) {
                available.push(source.descriptor.clone());
                paths.push(path.clone());
            }
        }

        if let Some(idx) = select_active(&available) {
            if paths[idx] != skill.path {
                debug!(
                    skill = %skill.id,
                    source = %available[idx].name,
                    path = %paths[idx].display(),
                    "active source overrides skill path"
                );
            }
            skill.path.clone_from(&paths[idx]);
            skill.active_source = Some(available[idx].clone());
        }
        skill.available_sources = available;
    }
}

/// Display name for a source: explicit name, then the marketplace's
/// self-declared name, then a name derived from the URL.
pub fn resolve_source_name(
    url: &str,
    explicit: Option<&str>,
    marketplace: Option<&dyn MarketplaceFetcher>,
) -> String {
    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    if let Some(fetcher) = marketplace {
        match fetcher.fetch_marketplace(url) {
            Ok(desc) if !desc.name.trim().is_empty() => return desc.name,
            Ok(_) => {}
            Err(err) => debug!(source = %url, error = %err, "marketplace name lookup failed"),
        }
    }
    name_from_url(url)
}

/// Derive a name from the first path segment of a source URL.
///
/// `github:acme/skills` and `https://host/acme/skills` give `acme`; a
/// local path gives its directory name.
#[must_use]
pub fn name_from_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if is_local_source(url) {
        let trimmed = url.strip_prefix("file:").unwrap_or(url);
        return std::path::Path::new(trimmed)
            .file_name()
            .map_or_else(|| "local".to_string(), |n| n.to_string_lossy().into_owned());
    }
    let path = if let Some((_, rest)) = url.split_once("://") {
        rest.split_once('/').map_or("", |(_, path)| path)
    } else if let Some((_, rest)) = url.split_once(':') {
        rest
    } else {
        url
    };
    // scp-style remotes: git@host:owner/repo
    let path = path.rsplit_once(':').map_or(path, |(_, p)| p);
    path.split('/')
        .find(|seg| !seg.is_empty())
        .map_or_else(|| url.to_string(), |seg| seg.trim_end_matches(".git").to_string())
}

/// Whether the public fallback check applies to a primary source.
#[must_use]
pub fn should_check_public(primary_url: &str) -> bool {
    primary_url != DEFAULT_SOURCE_URL && !is_local_source(primary_url)
}
