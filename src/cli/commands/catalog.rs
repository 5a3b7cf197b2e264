//! skillsmith catalog - Print the resolved catalog

use clap::Args;
use colored::Colorize;
use tracing::debug;

use crate::app::AppContext;
use crate::catalog::Catalog;
use crate::cli::output::emit_json;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Print the full catalog as JSON
    #[arg(long)]
    pub json: bool,

    /// Only list skills in this category
    #[arg(long)]
    pub category: Option<String>,
}

pub fn run(ctx: &AppContext, args: &CatalogArgs) -> Result<()> {
    let loaded = ctx.load_catalog()?;
    debug!(target: "catalog", skills = loaded.catalog.skills.len(), issues = loaded.issues.len());

    if args.json || ctx.robot_mode {
        return emit_json(&loaded.catalog);
    }
    display_catalog(&loaded.catalog, args.category.as_deref());
    for issue in &loaded.issues {
        eprintln!("{} {}: {}", "skipped".yellow(), issue.path.display(), issue.message);
    }
    Ok(())
}

fn display_catalog(catalog: &Catalog, only: Option<&str>) {
    let mut categories: Vec<_> = catalog.categories.iter().collect();
    categories.sort_by(|a, b| a.1.order.cmp(&b.1.order).then_with(|| a.0.cmp(b.0)));

    for (key, category) in categories {
        if only.is_some_and(|c| c != key) {
            continue;
        }
        let skills: Vec<_> = catalog.skills_in_category(key).collect();
        if skills.is_empty() {
            continue;
        }
        let marker = if category.exclusive { " (pick one)" } else { "" };
        println!("{}{}", category.name.bold(), marker.dimmed());
        for skill in skills {
            let source = skill
                .active_source
                .as_ref()
                .map(|s| s.name.as_str())
                .unwrap_or("-");
            println!(
                "  {:<36} {:<24} {}",
                skill.id.cyan(),
                skill.display_name,
                source.dimmed()
            );
        }
        println!();
    }

    let stray: Vec<_> = catalog
        .skills
        .values()
        .filter(|s| !catalog.categories.contains_key(&s.category))
        .filter(|s| only.is_none_or(|c| c == s.category))
        .collect();
    if !stray.is_empty() {
        println!("{}", "Uncategorized".bold());
        for skill in stray {
            println!("  {:<36} {}", skill.id.cyan(), skill.category.dimmed());
        }
    }
}
