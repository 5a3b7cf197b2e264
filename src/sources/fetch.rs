//! Source fetching.
//!
//! A source string is either a local path or a git remote. Remotes are
//! cloned into a per-source cache directory and refreshed on later runs.

use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::{FetchOptions as GitFetchOptions, Repository, ResetType};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{Result, SmithError};

use super::descriptor::is_local_source;

const CACHE_NAME_PREFIX_LEN: usize = 32;
const CACHE_NAME_HASH_LEN: usize = 12;

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Discard any cached clone and fetch again.
    pub force_refresh: bool,
}

/// A source materialized on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSource {
    pub path: PathBuf,
    pub from_cache: bool,
}

/// Materializes a source string as a directory.
pub trait SourceFetcher {
    fn fetch(&self, source: &str, options: &FetchOptions) -> Result<FetchedSource>;
}

/// Fetcher backed by the filesystem for local paths and git for remotes.
#[derive(Debug, Clone)]
pub struct GitSourceFetcher {
    cache_root: PathBuf,
}

impl GitSourceFetcher {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    #[must_use]
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    fn fetch_remote(&self, source: &str, options: &FetchOptions) -> Result<FetchedSource> {
        let url = normalize_git_url(source);
        let target = self.cache_root.join(cache_dir_name(source));
        let fetch_err = |err: git2::Error| SmithError::SourceFetch {
            source_url: source.to_string(),
            message: err.message().to_string(),
        };

        if target.join(".git").is_dir() && !options.force_refresh {
            match refresh_clone(&target) {
                Ok(()) => debug!(source = %source, path = %target.display(), "refreshed cached source"),
                Err(err) => {
                    warn!(source = %source, error = %err, "refresh failed, using cached copy");
                }
            }
            return Ok(FetchedSource {
                path: target,
                from_cache: true,
            });
        }

        if target.exists() {
            std::fs::remove_dir_all(&target)?;
        }
        std::fs::create_dir_all(&self.cache_root)?;

        info!(source = %source, url = %url, "cloning source");
        let mut fetch = GitFetchOptions::new();
        fetch.depth(1);
        RepoBuilder::new()
            .fetch_options(fetch)
            .clone(&url, &target)
            .map_err(fetch_err)?;
        Ok(FetchedSource {
            path: target,
            from_cache: false,
        })
    }
}

impl SourceFetcher for GitSourceFetcher {
    fn fetch(&self, source: &str, options: &FetchOptions) -> Result<FetchedSource> {
        if is_local_source(source) {
            let path = expand_local_path(source);
            if !path.exists() {
                return Err(SmithError::NotFound(format!(
                    "local source {}",
                    path.display()
                )));
            }
            return Ok(FetchedSource {
                path,
                from_cache: false,
            });
        }
        self.fetch_remote(source, options)
    }
}

fn refresh_clone(path: &Path) -> std::result::Result<(), git2::Error> {
    let repo = Repository::open(path)?;
    let mut remote = repo.find_remote("origin")?;
    remote.fetch::<&str>(&[], None, None)?;
    let head = repo.find_reference("FETCH_HEAD")?.peel_to_commit()?;
    repo.reset(head.as_object(), ResetType::Hard, None)?;
    Ok(())
}

fn expand_local_path(source: &str) -> PathBuf {
    let trimmed = source.strip_prefix("file:").unwrap_or(source);
    let trimmed = trimmed.strip_prefix("//").unwrap_or(trimmed);
    if let Some(rest) = trimmed.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(trimmed)
}

/// Turn shorthand remotes (`github:owner/repo`, `gitlab:owner/repo`) into
/// clonable URLs. Anything else is returned unchanged.
#[must_use]
pub fn normalize_git_url(source: &str) -> String {
    let source = source.trim();
    for (prefix, host) in [
        ("github:", "github.com"),
        ("gitlab:", "gitlab.com"),
        ("bitbucket:", "bitbucket.org"),
    ] {
        if let Some(rest) = source.strip_prefix(prefix) {
            let rest = rest.trim_end_matches(".git");
            return format!("https://{host}/{rest}.git");
        }
    }
    source.to_string()
}

/// Cache directory name for a source: the sanitized source string (runs
/// of other characters collapsed to one `-`) truncated to 32 characters,
/// a dash, and the first 12 hex characters of its SHA-256.
#[must_use]
pub fn cache_dir_name(source: &str) -> String {
    let mut sanitized = String::with_capacity(source.len());
    for c in source.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' };
        if c == '-' && sanitized.ends_with('-') {
            continue;
        }
        sanitized.push(c);
    }
    let sanitized: String = sanitized.chars().take(CACHE_NAME_PREFIX_LEN).collect();
    let digest = hex::encode(Sha256::digest(source.as_bytes()));
    format!("{sanitized}-{}", &digest[..CACHE_NAME_HASH_LEN])
}
