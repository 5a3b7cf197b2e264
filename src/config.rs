use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SmithError};
use crate::sources::{DEFAULT_SOURCE_URL, ExtraSource};

/// Directory under the project root holding skillsmith state.
pub const STATE_DIR: &str = ".skillsmith";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub compile: CompileSettings,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKILLSMITH_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let path = dirs::config_dir()
            .ok_or_else(|| SmithError::MissingConfig("config directory not found".to_string()))?
            .join("skillsmith")
            .join(CONFIG_FILE);
        Self::load_patch(&path)
    }

    fn load_project(root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&root.join(STATE_DIR).join(CONFIG_FILE))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| SmithError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| SmithError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.source {
            self.source.merge(patch);
        }
        if let Some(patch) = patch.compile {
            self.compile.merge(patch);
        }
        if let Some(patch) = patch.cache {
            self.cache.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `SKILLSMITH_*` overrides read through `lookup`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        if let Some(value) = env.string("SKILLSMITH_SOURCE") {
            self.source.primary = value;
        }
        if let Some(value) = env.string("SKILLSMITH_MARKETPLACE") {
            self.source.marketplace = Some(value);
        }
        if let Some(values) = env.list("SKILLSMITH_EXTRA_SOURCES") {
            let extras = values
                .into_iter()
                .map(|url| ExtraSourceConfig { name: None, url })
                .collect();
            self.source.extra = merge_unique_extras(extras, &self.source.extra);
        }

        if let Some(value) = env.string("SKILLSMITH_OUTPUT_DIR") {
            self.compile.output_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = env.string("SKILLSMITH_AUTHOR") {
            self.compile.author = Some(value);
        }

        if let Some(value) = env.string("SKILLSMITH_CACHE_DIR") {
            self.cache.dir = Some(PathBuf::from(value));
        }
        if let Some(value) = env.bool("SKILLSMITH_FORCE_REFRESH")? {
            self.cache.force_refresh = value;
        }

        Ok(())
    }

    /// Where remote sources are cloned.
    #[must_use]
    pub fn cache_dir(&self, root: &Path) -> PathBuf {
        self.cache.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir().map_or_else(
                || root.join(STATE_DIR).join("cache"),
                |dir| dir.join("skillsmith").join("sources"),
            )
        })
    }

    #[must_use]
    pub fn extra_sources(&self) -> Vec<ExtraSource> {
        self.source
            .extra
            .iter()
            .map(|extra| ExtraSource {
                name: extra.name.clone(),
                url: extra.url.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source")]
    pub primary: String,
    #[serde(default)]
    pub marketplace: Option<String>,
    #[serde(default)]
    pub extra: Vec<ExtraSourceConfig>,
}

fn default_source() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            primary: default_source(),
            marketplace: None,
            extra: Vec::new(),
        }
    }
}

impl SourceConfig {
    fn merge(&mut self, patch: SourcePatch) {
        if let Some(value) = patch.primary {
            self.primary = value;
        }
        if let Some(value) = patch.marketplace {
            self.marketplace = Some(value);
        }
        if let Some(values) = patch.extra {
            self.extra = merge_unique_extras(values, &self.extra);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraSourceConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileSettings {
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CompileSettings {
    fn merge(&mut self, patch: CompilePatch) {
        if let Some(value) = patch.output_dir {
            self.output_dir = Some(value);
        }
        if let Some(value) = patch.author {
            self.author = Some(value);
        }
        if let Some(values) = patch.keywords {
            self.keywords = merge_unique(values, &self.keywords);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub force_refresh: bool,
}

impl CacheConfig {
    fn merge(&mut self, patch: CachePatch) {
        if let Some(value) = patch.dir {
            self.dir = Some(value);
        }
        if let Some(value) = patch.force_refresh {
            self.force_refresh = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub source: Option<SourcePatch>,
    pub compile: Option<CompilePatch>,
    pub cache: Option<CachePatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SourcePatch {
    pub primary: Option<String>,
    pub marketplace: Option<String>,
    pub extra: Option<Vec<ExtraSourceConfig>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CompilePatch {
    pub output_dir: Option<PathBuf>,
    pub author: Option<String>,
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CachePatch {
    pub dir: Option<PathBuf>,
    pub force_refresh: Option<bool>,
}

fn merge_unique(values: Vec<String>, existing: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values.into_iter().chain(existing.iter().cloned()) {
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

fn merge_unique_extras(
    values: Vec<ExtraSourceConfig>,
    existing: &[ExtraSourceConfig],
) -> Vec<ExtraSourceConfig> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values.into_iter().chain(existing.iter().cloned()) {
        if seen.insert(value.url.clone()) {
            out.push(value);
        }
    }
    out
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn bool(&self, key: &str) -> Result<Option<bool>> {
        match self.string(key) {
            Some(value) => match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(SmithError::Config(format!("invalid {key} value {value}"))),
            },
            None => Ok(None),
        }
    }

    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.string(key).map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(ToString::to_string)
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_point_at_public_source() {
        let config = Config::default();
        assert_eq!(config.source.primary, DEFAULT_SOURCE_URL);
        assert!(!config.cache.force_refresh);
    }

    #[test]
    fn explicit_file_patches_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[source]
primary = "github:acme/skills"
extra = [{ name = "team", url = "github:team/skills" }]

[compile]
keywords = ["web"]
"#,
        )
        .unwrap();
        let config = Config::load(Some(&path), dir.path()).unwrap();
        assert_eq!(config.source.primary, "github:acme/skills");
        assert_eq!(config.extra_sources()[0].name.as_deref(), Some("team"));
        assert_eq!(config.compile.keywords, vec!["web"]);
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("SKILLSMITH_SOURCE", "./local-skills"),
            ("SKILLSMITH_EXTRA_SOURCES", "github:a/x, github:b/y"),
            ("SKILLSMITH_FORCE_REFRESH", "yes"),
            ("SKILLSMITH_AUTHOR", "Ada"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.source.extra.push(ExtraSourceConfig {
            name: None,
            url: "github:a/x".into(),
        });
        config
            .apply_overrides_from(|key| vars.get(key).map(ToString::to_string))
            .unwrap();
        assert_eq!(config.source.primary, "./local-skills");
        assert_eq!(config.source.extra.len(), 2);
        assert!(config.cache.force_refresh);
        assert_eq!(config.compile.author.as_deref(), Some("Ada"));
    }

    #[test]
    fn invalid_bool_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides_from(|key| (key == "SKILLSMITH_FORCE_REFRESH").then(|| "maybe".into()))
            .unwrap_err();
        assert_eq!(err.code(), "config");
    }
}
