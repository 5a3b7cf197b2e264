//! Generated project configuration and merge-with-existing.

pub mod config;
pub mod merge;

pub use config::{PROJECT_CONFIG_FILE, ProjectConfig, SkillEntry};
pub use merge::{MergeOutcome, merge_configs, merge_with_existing};
