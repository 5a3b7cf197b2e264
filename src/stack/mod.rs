//! Stacks, agent mappings and per-agent skill resolution.

pub mod mappings;
pub mod resolver;
pub mod types;

pub use mappings::AgentMappings;
pub use resolver::{ResolvedAgent, ResolvedAgentSkill, StackResolver, default_usage};
pub use types::{
    AgentSkillRef, AnnotatedAssignment, CompileAgentConfig, CompileConfig, SkillAssignment,
    Stack, load_stacks, parse_stacks,
};
