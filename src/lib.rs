//! skillsmith: skill catalog resolution and agent plugin compilation.
//!
//! The pipeline runs in stages. Sources are fetched and extracted into
//! flat records ([`catalog::extract`]), references are normalized to
//! canonical IDs ([`catalog::IdResolver`]), the relationship graph is built
//! ([`catalog::build_catalog`]), and every skill is tagged with the sources
//! providing it ([`sources::tag_catalog`]). A stack or compile config is
//! then resolved into per-agent skill lists ([`stack::StackResolver`]) and
//! compiled into a versioned plugin ([`compiler::compile_project`]).

pub mod app;
pub mod catalog;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod project;
pub mod sources;
pub mod stack;
pub mod test_utils;
pub mod utils;

pub use error::{Result, SmithError};
