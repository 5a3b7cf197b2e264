//! E2E test suite entry point.

#[path = "../common/mod.rs"]
mod common;
mod compile_workflow;
mod multi_source_workflow;
