//! CLI command implementations.
//!
//! Each subcommand has its own module with an Args struct and a `run()`
//! function.

use clap::Subcommand;

pub mod catalog;
pub mod compile;
pub mod sources;
pub mod validate;

use crate::app::AppContext;
use crate::error::Result;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Catalog(args) => catalog::run(ctx, args),
        Commands::Sources(args) => sources::run(ctx, args),
        Commands::Validate(args) => validate::run(ctx, args),
        Commands::Compile(args) => compile::run(ctx, args),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved catalog
    Catalog(catalog::CatalogArgs),

    /// Show every source providing a skill
    Sources(sources::SourcesArgs),

    /// Validate a skill selection
    Validate(validate::ValidateArgs),

    /// Compile a stack or compile config into a plugin
    Compile(compile::CompileArgs),
}
