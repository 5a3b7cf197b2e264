//! Plugin manifest (`.claude-plugin/plugin.json`) and its content-hash
//! sidecar.

use std::path::{Path, PathBuf};

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SmithError};
use crate::utils::write_file;

pub const PLUGIN_DIR: &str = ".claude-plugin";
pub const MANIFEST_FILE: &str = "plugin.json";
pub const CONTENT_HASH_FILE: &str = ".content-hash";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<PluginAuthor>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Stored in the sidecar file, not in `plugin.json`.
    #[serde(skip)]
    pub content_hash: Option<String>,
}

impl PluginManifest {
    #[must_use]
    pub fn manifest_path(output_dir: &Path) -> PathBuf {
        output_dir.join(PLUGIN_DIR).join(MANIFEST_FILE)
    }

    #[must_use]
    pub fn hash_path(output_dir: &Path) -> PathBuf {
        output_dir.join(PLUGIN_DIR).join(CONTENT_HASH_FILE)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|err| {
            SmithError::ValidationFailed(format!("plugin manifest JSON parse error: {err}"))
        })
    }

    pub fn validate(&self) -> Result<()> {
        validate_required("name", &self.name)?;
        validate_required("version", &self.version)?;
        Version::parse(&self.version).map_err(|err| {
            SmithError::ValidationFailed(format!("version must be valid semver: {err}"))
        })?;
        Ok(())
    }

    /// Load the manifest and sidecar from an output directory.
    /// `Ok(None)` when no manifest exists yet.
    pub fn load(output_dir: &Path) -> Result<Option<Self>> {
        let path = Self::manifest_path(output_dir);
        if !path.is_file() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let mut manifest = Self::from_json_str(&raw)?;
        manifest.content_hash = std::fs::read_to_string(Self::hash_path(output_dir))
            .ok()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        Ok(Some(manifest))
    }

    /// Write `plugin.json` and, when set, the hash sidecar.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        self.validate()?;
        let path = Self::manifest_path(output_dir);
        let json = serde_json::to_string_pretty(self)?;
        write_file(&path, format!("{json}\n"))?;
        if let Some(hash) = &self.content_hash {
            write_file(Self::hash_path(output_dir), format!("{hash}\n"))?;
        }
        Ok(path)
    }
}

fn validate_required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SmithError::ValidationFailed(format!(
            "{field} must be non-empty"
        )));
    }
    Ok(())
}
