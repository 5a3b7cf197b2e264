//! Agent text fragments.
//!
//! Each agent directory holds markdown fragments that frame its compiled
//! artifact. `intro.md` and `workflow.md` are required. `output-format.md`
//! falls back to the shared `_templates/` copy, then to a built-in default.
//! Everything else is optional and defaults to empty.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::catalog::AgentDefinition;
use crate::error::{Result, SmithError};

pub const INTRO_FILE: &str = "intro.md";
pub const WORKFLOW_FILE: &str = "workflow.md";
pub const EXAMPLES_FILE: &str = "examples.md";
pub const CRITICAL_REQUIREMENTS_FILE: &str = "critical-requirements.md";
pub const CRITICAL_REMINDERS_FILE: &str = "critical-reminders.md";
pub const OUTPUT_FORMAT_FILE: &str = "output-format.md";
pub const TEMPLATES_DIR: &str = "_templates";

pub const DEFAULT_OUTPUT_FORMAT: &str = "\
## Output Format

Summarize what you changed, list the files touched, and call out anything \
that still needs a decision.";

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AgentFragments {
    pub intro: String,
    pub workflow: String,
    pub examples: String,
    pub critical_requirements: String,
    pub critical_reminders: String,
    pub output_format: String,
}

impl AgentFragments {
    /// Read the fragments for an agent. `agents_root` holds the shared
    /// `_templates/` directory.
    pub fn load(agent: &AgentDefinition, agents_root: &Path) -> Result<Self> {
        let dir = agent.path.as_path();
        let output_format = match read_fragment(dir, OUTPUT_FORMAT_FILE)? {
            Some(text) => text,
            None => match read_fragment(&agents_root.join(TEMPLATES_DIR), OUTPUT_FORMAT_FILE)? {
                Some(text) => text,
                None => {
                    debug!(agent = %agent.id, "using built-in output format");
                    DEFAULT_OUTPUT_FORMAT.to_string()
                }
            },
        };

        Ok(Self {
            intro: require_fragment(agent, INTRO_FILE)?,
            workflow: require_fragment(agent, WORKFLOW_FILE)?,
            examples: read_fragment(dir, EXAMPLES_FILE)?.unwrap_or_default(),
            critical_requirements: read_fragment(dir, CRITICAL_REQUIREMENTS_FILE)?
                .unwrap_or_default(),
            critical_reminders: read_fragment(dir, CRITICAL_REMINDERS_FILE)?.unwrap_or_default(),
            output_format,
        })
    }
}

fn require_fragment(agent: &AgentDefinition, name: &str) -> Result<String> {
    read_fragment(&agent.path, name)?.ok_or_else(|| {
        SmithError::NotFound(format!(
            "agent `{}` fragment {}",
            agent.id,
            agent.path.join(name).display()
        ))
    })
}

fn read_fragment(dir: &Path, name: &str) -> Result<Option<String>> {
    let path = dir.join(name);
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|err| SmithError::Config(format!("read fragment {}: {err}", path.display())))?;
    Ok(Some(text.trim().to_string()))
}
