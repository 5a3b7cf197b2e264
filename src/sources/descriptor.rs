//! Source descriptors attached to catalog skills.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default well-known public skills source.
pub const DEFAULT_SOURCE_URL: &str = "github:skillsmith/skills";

/// Visibility of a source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Public,
    Private,
    Local,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Local => "local",
        };
        f.write_str(label)
    }
}

/// How an installed copy landed in the project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    Local,
    Plugin,
}

/// One place a skill was found.
///
/// "Installed" is orthogonal to the source type: a public source can also be
/// installed into the project as a plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(default)]
    pub installed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_mode: Option<InstallMode>,
    #[serde(default)]
    pub primary: bool,
}

impl SourceDescriptor {
    /// Descriptor for the primary catalog source.
    #[must_use]
    pub fn primary(name: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let source_type = classify_url(&url);
        Self {
            name: name.into(),
            url,
            source_type,
            installed: false,
            install_mode: None,
            primary: true,
        }
    }

    /// Descriptor for an additional, non-primary source.
    #[must_use]
    pub fn extra(name: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let source_type = classify_url(&url);
        Self {
            name: name.into(),
            url,
            source_type,
            installed: false,
            install_mode: None,
            primary: false,
        }
    }

    /// Descriptor for the default public source checked as a fallback.
    #[must_use]
    pub fn public_fallback() -> Self {
        Self {
            name: "public".to_string(),
            url: DEFAULT_SOURCE_URL.to_string(),
            source_type: SourceType::Public,
            installed: false,
            install_mode: None,
            primary: false,
        }
    }

    /// Descriptor for a skill copied into the project itself.
    #[must_use]
    pub fn local_install(project_skills_dir: impl Into<String>) -> Self {
        Self {
            name: "local".to_string(),
            url: project_skills_dir.into(),
            source_type: SourceType::Local,
            installed: true,
            install_mode: Some(InstallMode::Local),
            primary: false,
        }
    }

    /// Descriptor for an installed plugin. The plugin keeps the visibility
    /// of the source it was installed from.
    #[must_use]
    pub fn plugin_install(
        name: impl Into<String>,
        url: impl Into<String>,
        source_type: SourceType,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            source_type,
            installed: true,
            install_mode: Some(InstallMode::Plugin),
            primary: false,
        }
    }

    #[must_use]
    pub fn is_local_override(&self) -> bool {
        self.installed
            && match self.install_mode {
                Some(InstallMode::Local) => true,
                Some(InstallMode::Plugin) => false,
                None => self.source_type == SourceType::Local,
            }
    }

    #[must_use]
    pub fn is_installed_plugin(&self) -> bool {
        self.installed && self.install_mode == Some(InstallMode::Plugin)
    }
}

/// Whether a source string names a local path rather than a remote.
#[must_use]
pub fn is_local_source(source: &str) -> bool {
    source.starts_with('/')
        || source.starts_with("./")
        || source.starts_with("../")
        || source.starts_with('~')
        || source.starts_with("file:")
        || source == "."
        || (source.len() > 2 && source.as_bytes()[1] == b':' && source.as_bytes()[2] == b'\\')
}

fn classify_url(url: &str) -> SourceType {
    if is_local_source(url) {
        SourceType::Local
    } else if url == DEFAULT_SOURCE_URL {
        SourceType::Public
    } else {
        SourceType::Private
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_classifies_default_as_public() {
        let desc = SourceDescriptor::primary("skillsmith", DEFAULT_SOURCE_URL);
        assert_eq!(desc.source_type, SourceType::Public);
        assert!(desc.primary);
        assert!(!desc.installed);
    }

    #[test]
    fn other_remotes_are_private_and_paths_local() {
        assert_eq!(
            SourceDescriptor::extra("acme", "github:acme/skills").source_type,
            SourceType::Private
        );
        assert_eq!(
            SourceDescriptor::extra("mine", "./my-skills").source_type,
            SourceType::Local
        );
    }

    #[test]
    fn plugin_install_can_be_public() {
        let desc = SourceDescriptor::plugin_install("web", "/p/web", SourceType::Public);
        assert!(desc.is_installed_plugin());
        assert!(!desc.is_local_override());
        assert_eq!(desc.source_type, SourceType::Public);

        let from_local = SourceDescriptor::plugin_install("web", "/p/web", SourceType::Local);
        assert!(!from_local.is_local_override());
    }

    #[test]
    fn serializes_type_field_lowercase() {
        let json = serde_json::to_value(SourceDescriptor::local_install(".claude/skills")).unwrap();
        assert_eq!(json["type"], "local");
        assert_eq!(json["install_mode"], "local");
        assert_eq!(json["installed"], true);
    }
}
