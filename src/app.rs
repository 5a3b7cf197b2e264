use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{Config, STATE_DIR};
use crate::error::Result;
use crate::sources::{
    CatalogLoader, GitSourceFetcher, LoadOptions, LoadedCatalog, SourceMarketplaceFetcher,
};

pub struct AppContext {
    /// Project root: holds `.skillsmith/` and the installed `.claude/` copies.
    pub root: PathBuf,
    pub config: Config,
    pub fetcher: GitSourceFetcher,
    pub robot_mode: bool,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let root = match &cli.project {
            Some(dir) => dir.clone(),
            None => Self::find_root()?,
        };
        let mut config = Config::load(cli.config.as_deref(), &root)?;
        if let Some(source) = &cli.source {
            config.source.primary = source.clone();
        }
        let fetcher = GitSourceFetcher::new(config.cache_dir(&root));
        debug!(root = %root.display(), source = %config.source.primary, "context ready");

        Ok(Self {
            root,
            config,
            fetcher,
            robot_mode: cli.robot,
        })
    }

    fn find_root() -> Result<PathBuf> {
        if let Ok(root) = std::env::var("SKILLSMITH_ROOT") {
            return Ok(PathBuf::from(root));
        }
        let cwd = std::env::current_dir()?;
        Ok(find_upwards(&cwd, STATE_DIR).unwrap_or(cwd))
    }

    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            primary: self.config.source.primary.clone(),
            marketplace_name: self.config.source.marketplace.clone(),
            extras: self.config.extra_sources(),
            project_dir: Some(self.root.clone()),
            force_refresh: self.config.cache.force_refresh,
        }
    }

    /// Fetch every configured source and build the tagged catalog.
    pub fn load_catalog(&self) -> Result<LoadedCatalog> {
        let marketplace = SourceMarketplaceFetcher::new(&self.fetcher);
        CatalogLoader::new(&self.fetcher, &marketplace).load(&self.load_options())
    }
}

/// Nearest ancestor of `start` (inclusive) containing a `name` directory.
fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(name).is_dir())
        .map(Path::to_path_buf)
}
