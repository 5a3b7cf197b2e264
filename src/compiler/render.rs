//! Agent artifact rendering.

use serde::Serialize;

use crate::error::{Result, SmithError};
use crate::stack::{ResolvedAgent, ResolvedAgentSkill};

use super::fragments::AgentFragments;

/// Name of the built-in agent template.
pub const AGENT_TEMPLATE: &str = "agent";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkillTemplateData {
    pub id: String,
    pub description: String,
    pub usage: String,
    pub content: String,
}

impl From<&ResolvedAgentSkill> for SkillTemplateData {
    fn from(skill: &ResolvedAgentSkill) -> Self {
        Self {
            id: skill.id.clone(),
            description: skill.description.clone(),
            usage: skill.usage.clone(),
            content: skill.content.clone(),
        }
    }
}

/// Everything a template needs to render one agent.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AgentTemplateData {
    pub name: String,
    pub title: String,
    pub description: String,
    pub model: Option<String>,
    pub tools: Vec<String>,
    pub fragments: AgentFragments,
    pub preloaded_skills: Vec<SkillTemplateData>,
    pub dynamic_skills: Vec<SkillTemplateData>,
}

impl AgentTemplateData {
    #[must_use]
    pub fn new(agent: &ResolvedAgent, fragments: AgentFragments) -> Self {
        Self {
            name: agent.name.clone(),
            title: agent.definition.title.clone(),
            description: agent.definition.description.clone(),
            model: agent.definition.model.clone(),
            tools: agent.definition.tools.clone(),
            fragments,
            preloaded_skills: agent.preloaded_skills().map(Into::into).collect(),
            dynamic_skills: agent.dynamic_skills().map(Into::into).collect(),
        }
    }
}

pub trait TemplateRenderer {
    fn render(&self, template: &str, data: &AgentTemplateData) -> Result<String>;
}

/// Built-in renderer producing markdown with YAML frontmatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

#[derive(Serialize)]
struct Frontmatter<'a> {
    name: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skills: Vec<&'a str>,
}

impl TemplateRenderer for MarkdownRenderer {
    fn render(&self, template: &str, data: &AgentTemplateData) -> Result<String> {
        if template != AGENT_TEMPLATE {
            return Err(SmithError::Template(format!("unknown template `{template}`")));
        }
        render_agent(data)
    }
}

fn render_agent(data: &AgentTemplateData) -> Result<String> {
    let frontmatter = Frontmatter {
        name: &data.name,
        description: &data.description,
        tools: (!data.tools.is_empty()).then(|| data.tools.join(", ")),
        model: data.model.as_deref(),
        skills: data.preloaded_skills.iter().map(|s| s.id.as_str()).collect(),
    };
    let yaml = serde_yaml::to_string(&frontmatter)
        .map_err(|err| SmithError::Template(format!("frontmatter: {err}")))?;

    let mut output = String::new();
    output.push_str("---\n");
    output.push_str(&yaml);
    output.push_str("---\n\n");
    output.push_str(&format!("# {}\n\n", data.title));

    let f = &data.fragments;
    push_section(&mut output, None, &f.intro);
    push_section(&mut output, Some("Critical Requirements"), &f.critical_requirements);

    if !data.preloaded_skills.is_empty() {
        output.push_str("## Preloaded Skills\n\n");
        for skill in &data.preloaded_skills {
            output.push_str(&format!("### {}\n\n", skill.id));
            if !skill.content.is_empty() {
                output.push_str(&skill.content);
                output.push_str("\n\n");
            }
        }
    }

    if !data.dynamic_skills.is_empty() {
        output.push_str("## Available Skills\n\n");
        output.push_str("Load these with the Skill tool when the task calls for them.\n\n");
        for skill in &data.dynamic_skills {
            output.push_str(&format!("- `{}`: {} {}\n", skill.id, skill.description, skill.usage));
        }
        output.push('\n');
    }

    push_section(&mut output, Some("Workflow"), &f.workflow);
    push_section(&mut output, Some("Examples"), &f.examples);
    push_section(&mut output, None, &f.output_format);
    push_section(&mut output, Some("Critical Reminders"), &f.critical_reminders);

    Ok(format!("{}\n", output.trim_end()))
}

fn push_section(output: &mut String, heading: Option<&str>, body: &str) {
    if body.trim().is_empty() {
        return;
    }
    if let Some(heading) = heading {
        output.push_str(&format!("## {heading}\n\n"));
    }
    output.push_str(body.trim());
    output.push_str("\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(id: &str, content: &str) -> SkillTemplateData {
        SkillTemplateData {
            id: id.into(),
            description: format!("{id} description."),
            usage: format!("Use for {id}."),
            content: content.into(),
        }
    }

    fn data() -> AgentTemplateData {
        AgentTemplateData {
            name: "web-developer".into(),
            title: "Web Developer".into(),
            description: "Builds UI".into(),
            model: Some("opus".into()),
            tools: vec!["Read".into(), "Write".into()],
            fragments: AgentFragments {
                intro: "You build web apps.".into(),
                workflow: "1. Read\n2. Write".into(),
                ..AgentFragments::default()
            },
            preloaded_skills: vec![skill("react", "# React body")],
            dynamic_skills: vec![skill("vitest", "# unused")],
        }
    }

    #[test]
    fn renders_frontmatter_and_sections() {
        let out = MarkdownRenderer.render(AGENT_TEMPLATE, &data()).unwrap();
        assert!(out.starts_with("---\nname: web-developer\n"));
        assert!(out.contains("tools: Read, Write"));
        assert!(out.contains("skills:\n- react\n"));
        assert!(out.contains("## Preloaded Skills\n\n### react\n\n# React body"));
        assert!(out.contains("- `vitest`: vitest description. Use for vitest."));
        assert!(!out.contains("# unused"));
        assert!(!out.contains("## Examples"));
        assert!(out.find("## Preloaded Skills").unwrap() < out.find("## Workflow").unwrap());
    }

    #[test]
    fn unknown_template_is_an_error() {
        let err = MarkdownRenderer.render("nope", &data()).unwrap_err();
        assert!(matches!(err, SmithError::Template(_)));
    }
}
