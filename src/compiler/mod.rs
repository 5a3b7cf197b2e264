//! Agent compilation and plugin versioning.

pub mod fragments;
pub mod manifest;
pub mod pipeline;
pub mod render;
pub mod versioning;

pub use fragments::AgentFragments;
pub use manifest::{PluginAuthor, PluginManifest};
pub use pipeline::{
    AgentSummary, CompileInput, CompileReport, CompileRequest, bundle_dir_name, compile_project,
};
pub use render::{AGENT_TEMPLATE, AgentTemplateData, MarkdownRenderer, TemplateRenderer};
pub use versioning::{DEFAULT_VERSION, VersionDecision, bump_major, content_hash, next_version};
