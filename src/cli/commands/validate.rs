//! skillsmith validate - Validate a skill selection

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::catalog::validate_selection;
use crate::cli::output::{emit_json, print_report};
use crate::error::{Result, SmithError};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Skill IDs, aliases or directory paths
    #[arg(required = true)]
    pub skills: Vec<String>,
}

pub fn run(ctx: &AppContext, args: &ValidateArgs) -> Result<()> {
    let loaded = ctx.load_catalog()?;
    let report = validate_selection(&loaded.catalog, &args.skills);

    if ctx.robot_mode {
        emit_json(&report)?;
    } else {
        if report.is_valid() {
            println!("{} {}", "valid".green().bold(), report.selected.join(", "));
        } else {
            println!("{} {}", "invalid".red().bold(), report.selected.join(", "));
        }
        print_report(&report);
    }

    if report.is_valid() {
        Ok(())
    } else {
        Err(SmithError::ValidationFailed(format!(
            "{} selection error(s)",
            report.errors.len()
        )))
    }
}
