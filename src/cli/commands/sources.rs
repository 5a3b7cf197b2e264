//! skillsmith sources - Show every source providing a skill

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::catalog::IdResolver;
use crate::cli::output::emit_json;
use crate::error::{Result, SmithError};
use crate::sources::SourceDescriptor;

#[derive(Args, Debug)]
pub struct SourcesArgs {
    /// Skill ID, alias or directory path
    pub skill: String,
}

#[derive(Debug, Serialize)]
struct SourcesView<'a> {
    id: &'a str,
    path: String,
    active: Option<&'a SourceDescriptor>,
    available: &'a [SourceDescriptor],
}

pub fn run(ctx: &AppContext, args: &SourcesArgs) -> Result<()> {
    let loaded = ctx.load_catalog()?;
    let resolver = IdResolver::from_catalog(&loaded.catalog);
    let skill = resolver
        .lookup(&args.skill)
        .and_then(|(id, _)| loaded.catalog.get(id))
        .ok_or_else(|| SmithError::SkillNotFound(args.skill.clone()))?;

    if ctx.robot_mode {
        return emit_json(&SourcesView {
            id: &skill.id,
            path: skill.path.display().to_string(),
            active: skill.active_source.as_ref(),
            available: &skill.available_sources,
        });
    }

    println!("{} ({})", skill.id.bold(), skill.path.display());
    for source in &skill.available_sources {
        let active = skill.active_source.as_ref() == Some(source);
        let marker = if active { "*".green().bold() } else { " ".normal() };
        let mut flags = vec![source.source_type.to_string()];
        if source.primary {
            flags.push("primary".to_string());
        }
        if let Some(mode) = source.install_mode {
            flags.push(format!("installed:{}", format!("{mode:?}").to_lowercase()));
        }
        println!(
            " {marker} {:<24} {:<40} {}",
            source.name,
            source.url,
            flags.join(", ").dimmed()
        );
    }
    Ok(())
}
