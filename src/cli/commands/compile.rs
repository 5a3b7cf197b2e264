//! skillsmith compile - Compile a stack or compile config into a plugin

use std::path::PathBuf;

use clap::{ArgGroup, Args};
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::compiler::{
    CompileInput, CompileReport, CompileRequest, MarkdownRenderer, VersionDecision,
    compile_project,
};
use crate::error::{Result, SmithError};
use crate::stack::CompileConfig;

/// Output directory used when neither the flag nor the config sets one.
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["stack", "config_file"])))]
pub struct CompileArgs {
    /// Stack ID from the primary source
    #[arg(long)]
    pub stack: Option<String>,

    /// YAML compile config with explicit agent skill lists
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Output directory for the compiled plugin
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &CompileArgs) -> Result<()> {
    let input = match (&args.stack, &args.config_file) {
        (Some(stack), _) => CompileInput::Stack(stack.clone()),
        (None, Some(path)) => CompileInput::Config(CompileConfig::load(path)?),
        (None, None) => {
            return Err(SmithError::Config(
                "pass either --stack or --config-file".to_string(),
            ));
        }
    };
    let output_dir = args
        .output
        .clone()
        .or_else(|| ctx.config.compile.output_dir.clone())
        .unwrap_or_else(|| ctx.root.join(DEFAULT_OUTPUT_DIR));

    let loaded = ctx.load_catalog()?;
    let request = CompileRequest {
        loaded: &loaded,
        input,
        project_dir: ctx.root.clone(),
        output_dir,
        author: ctx.config.compile.author.clone(),
        keywords: ctx.config.compile.keywords.clone(),
        renderer: &MarkdownRenderer,
    };
    let report = compile_project(&request)?;

    if ctx.robot_mode {
        return emit_json(&report);
    }
    display_report(&report);
    Ok(())
}

fn display_report(report: &CompileReport) {
    let version = match &report.version {
        VersionDecision::Initial { version } => format!("{version} (initial)"),
        VersionDecision::Unchanged { version } => format!("{version} (unchanged)"),
        VersionDecision::MajorBump { from, version } => format!("{from} -> {version}"),
    };
    println!(
        "{} {} {}",
        "compiled".green().bold(),
        report.name.bold(),
        version
    );
    for agent in &report.agents {
        println!(
            "  {:<28} {} preloaded, {} on demand",
            agent.name.cyan(),
            agent.preloaded.len(),
            agent.dynamic.len()
        );
    }
    println!("  {} skill directories bundled", report.skill_dirs.len());
    if report.merged_existing_config {
        println!(
            "  merged into existing {}",
            report.project_config_path.display()
        );
    }
    for issue in &report.warnings {
        println!("  {} {}", "warning".yellow().bold(), issue.message);
    }
    println!("  output: {}", report.output_dir.display());
}
