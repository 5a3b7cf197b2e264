//! Skill catalog: extraction, ID resolution and the relationship graph.

pub mod alias;
pub mod extract;
pub mod graph;
pub mod rules;
pub mod selection;
pub mod types;

pub use alias::{IdResolver, MatchKind};
pub use extract::{
    ExtractOptions, Extraction, ExtractionContext, ExtractionIssue, SourceLayout,
    extract_agents, extract_layout, extract_skills, extract_source, load_skill_body,
};
pub use graph::{GraphBuilder, build_catalog};
pub use rules::RelationshipRules;
pub use selection::{IssueKind, SelectionIssue, SelectionReport, validate_selection};
pub use types::{
    AgentDefinition, Catalog, CategoryDefinition, METADATA_REASON, RawSkill, RequireGroup,
    ResolvedSkill, SkillAlternative, SkillRelation,
};
