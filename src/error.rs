//! Error types for skillsmith.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SmithError>;

#[derive(Debug, Error)]
pub enum SmithError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("skill not found: {0}")]
    SkillNotFound(String),

    #[error("invalid skill: {0}")]
    InvalidSkill(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("failed to fetch source {source_url}: {message}")]
    SourceFetch { source_url: String, message: String },

    #[error("marketplace descriptor is {size} bytes (limit {limit})")]
    MarketplaceTooLarge { size: u64, limit: u64 },

    #[error("marketplace descriptor nests {depth} levels deep (limit {limit})")]
    MarketplaceTooDeep { depth: usize, limit: usize },

    #[error("marketplace lists {count} plugins (limit {limit})")]
    MarketplaceTooManyPlugins { count: usize, limit: usize },

    #[error("template error: {0}")]
    Template(String),
}

impl SmithError {
    /// Stable machine-readable code used by robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Yaml(_) | Self::Json(_) => "parse",
            Self::Git(_) | Self::SourceFetch { .. } => "source_fetch",
            Self::Config(_) | Self::MissingConfig(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::SkillNotFound(_) => "skill_not_found",
            Self::InvalidSkill(_) | Self::ValidationFailed(_) => "validation_failed",
            Self::MarketplaceTooLarge { .. }
            | Self::MarketplaceTooDeep { .. }
            | Self::MarketplaceTooManyPlugins { .. } => "marketplace_limit",
            Self::Template(_) => "template",
        }
    }
}
