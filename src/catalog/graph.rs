//! Relationship graph construction.
//!
//! Builds the resolved catalog from extracted records plus the merged rule
//! set. Relations come from two provenance levels: the skill's own metadata
//! (reason [`METADATA_REASON`]) and matrix-level rules. Within each relation
//! list entries are deduplicated by target, first reason wins.
//!
//! Conflicts and discourages declared by rules are symmetric: every member
//! of the rule gets every other member. Recommends and requires are
//! directional; their inverses (`recommended_by`, `required_by`) are filled
//! in a second pass once every forward relation exists.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::alias::IdResolver;
use super::extract::ExtractionContext;
use super::rules::RelationshipRules;
use super::types::{
    AgentDefinition, Catalog, CategoryDefinition, METADATA_REASON, RawSkill, RequireGroup,
    ResolvedSkill, SkillAlternative, SkillRelation,
};

/// Rules with every skill reference rewritten to canonical IDs.
#[derive(Debug, Default)]
struct ResolvedRules {
    conflicts: Vec<(Vec<String>, String)>,
    discourages: Vec<(Vec<String>, String)>,
    recommends: Vec<(String, Vec<String>, String)>,
    requires: Vec<(String, RequireGroup)>,
    alternatives: Vec<(String, Vec<String>)>,
    per_skill: BTreeMap<String, super::rules::PerSkillRule>,
}

impl ResolvedRules {
    fn new(rules: &RelationshipRules, resolver: &IdResolver) -> Self {
        let rel = &rules.relationships;
        let conflicts = rel
            .conflicts
            .iter()
            .map(|r| {
                let ids = resolver.resolve_all(&r.skills, "conflict rule");
                (ids, r.reason.clone())
            })
            .collect();
        let discourages = rel
            .discourages
            .iter()
            .map(|r| {
                let ids = resolver.resolve_all(&r.skills, "discourage rule");
                (ids, r.reason.clone())
            })
            .collect();
        let recommends = rel
            .recommends
            .iter()
            .map(|r| {
                let context = format!("recommend rule for `{}`", r.when);
                (
                    resolver.resolve(&r.when, &context),
                    resolver.resolve_all(&r.suggest, &context),
                    r.reason.clone(),
                )
            })
            .collect();
        let requires = rel
            .requires
            .iter()
            .map(|r| {
                let context = format!("require rule for `{}`", r.skill);
                (
                    resolver.resolve(&r.skill, &context),
                    RequireGroup {
                        skill_ids: resolver.resolve_all(&r.needs, &context),
                        needs_any: r.needs_any,
                        reason: r.reason.clone(),
                    },
                )
            })
            .collect();
        let alternatives = rel
            .alternatives
            .iter()
            .map(|g| {
                let context = format!("alternatives for `{}`", g.purpose);
                (g.purpose.clone(), resolver.resolve_all(&g.skills, &context))
            })
            .collect();
        let per_skill = rules
            .per_skill
            .iter()
            .map(|(key, rule)| (resolver.resolve(key, "per-skill rule"), rule.clone()))
            .collect();

        Self {
            conflicts,
            discourages,
            recommends,
            requires,
            alternatives,
            per_skill,
        }
    }
}

/// Builds a [`Catalog`] from extracted records.
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    rules: &'a RelationshipRules,
    resolver: IdResolver,
}

impl<'a> GraphBuilder<'a> {
    #[must_use]
    pub fn new(skills: &[RawSkill], rules: &'a RelationshipRules) -> Self {
        Self {
            rules,
            resolver: IdResolver::from_raw_skills(skills, &rules.skill_aliases),
        }
    }

    #[must_use]
    pub const fn resolver(&self) -> &IdResolver {
        &self.resolver
    }

    /// Build the catalog. Records sharing an ID keep the first occurrence.
    #[must_use]
    pub fn build(
        &self,
        skills: Vec<RawSkill>,
        agents: Vec<AgentDefinition>,
        ctx: &ExtractionContext,
    ) -> Catalog {
        let rules = ResolvedRules::new(self.rules, &self.resolver);

        let mut resolved: BTreeMap<String, ResolvedSkill> = BTreeMap::new();
        for raw in skills {
            if resolved.contains_key(&raw.id) {
                debug!(skill = %raw.id, path = %raw.path.display(), "duplicate skill record ignored");
                continue;
            }
            let skill = self.resolve_skill(raw, &rules);
            resolved.insert(skill.id.clone(), skill);
        }

        compute_inverse_edges(&mut resolved);
        report_dangling(&resolved);

        let mut categories = self.rules.categories.clone();
        for category in &ctx.discovered_custom_categories {
            categories
                .entry(category.clone())
                .or_insert_with(|| CategoryDefinition {
                    name: category.rsplit('/').next().unwrap_or(category).to_string(),
                    custom: true,
                    order: u32::MAX,
                    ..CategoryDefinition::default()
                });
        }

        let mut agent_map = BTreeMap::new();
        for agent in agents {
            if agent_map.contains_key(&agent.id) {
                debug!(agent = %agent.id, "duplicate agent definition ignored");
                continue;
            }
            agent_map.insert(agent.id.clone(), agent);
        }

        info!(
            skills = resolved.len(),
            agents = agent_map.len(),
            categories = categories.len(),
            "catalog built"
        );

        Catalog {
            version: if self.rules.version.is_empty() {
                "1.0.0".to_string()
            } else {
                self.rules.version.clone()
            },
            generated_at: Utc::now(),
            categories,
            skills: resolved,
            aliases: self.rules.skill_aliases.clone(),
            agents: agent_map,
        }
    }

    fn resolve_skill(&self, raw: RawSkill, rules: &ResolvedRules) -> ResolvedSkill {
        let id = raw.id.clone();
        let r = &self.resolver;
        let ctx = |field: &str| format!("in skill `{id}`'s `{field}` list");

        let mut conflicts = Vec::new();
        for target in r.resolve_all(&raw.conflicts_with, &ctx("conflicts_with")) {
            push_relation(&mut conflicts, &id, target, METADATA_REASON);
        }
        for (ids, reason) in &rules.conflicts {
            if ids.contains(&id) {
                for other in ids {
                    push_relation(&mut conflicts, &id, other.clone(), reason);
                }
            }
        }

        let mut discourages = Vec::new();
        for target in r.resolve_all(&raw.discourages, &ctx("discourages")) {
            push_relation(&mut discourages, &id, target, METADATA_REASON);
        }
        for (ids, reason) in &rules.discourages {
            if ids.contains(&id) {
                for other in ids {
                    push_relation(&mut discourages, &id, other.clone(), reason);
                }
            }
        }

        let compatible_with = r.resolve_all(&raw.compatible_with, &ctx("compatible_with"));
        let mut recommends = Vec::new();
        for target in &compatible_with {
            push_relation(&mut recommends, &id, target.clone(), METADATA_REASON);
        }
        for (when, suggest, reason) in &rules.recommends {
            if *when == id {
                for target in suggest {
                    push_relation(&mut recommends, &id, target.clone(), reason);
                }
            }
        }

        let mut requires = Vec::new();
        let declared = r.resolve_all(&raw.requires, &ctx("requires"));
        if !declared.is_empty() {
            push_group(
                &mut requires,
                RequireGroup {
                    skill_ids: declared,
                    needs_any: false,
                    reason: METADATA_REASON.to_string(),
                },
            );
        }
        for (skill, group) in &rules.requires {
            if *skill == id {
                push_group(&mut requires, group.clone());
            }
        }

        let mut alternatives: Vec<SkillAlternative> = Vec::new();
        for (purpose, ids) in &rules.alternatives {
            if !ids.contains(&id) {
                continue;
            }
            for other in ids {
                if *other != id && !alternatives.iter().any(|a| a.skill_id == *other) {
                    alternatives.push(SkillAlternative {
                        purpose: purpose.clone(),
                        skill_id: other.clone(),
                    });
                }
            }
        }

        let mut usage_guidance = raw.usage_guidance;
        let mut tags = raw.tags;
        if let Some(rule) = rules.per_skill.get(&id) {
            if rule.usage_guidance.is_some() {
                usage_guidance.clone_from(&rule.usage_guidance);
            }
            for tag in &rule.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }

        let requires_setup = r.resolve_all(&raw.requires_setup, &ctx("requires_setup"));
        let provides_setup_for =
            r.resolve_all(&raw.provides_setup_for, &ctx("provides_setup_for"));

        ResolvedSkill {
            id,
            directory_path: raw.directory_path,
            category: raw.category,
            category_exclusive: raw.category_exclusive,
            display_name: raw.display_name,
            description: raw.description,
            usage_guidance,
            tags,
            author: raw.author,
            custom: raw.custom,
            path: raw.path,
            conflicts_with: conflicts,
            discourages,
            recommends,
            recommended_by: Vec::new(),
            requires,
            required_by: Vec::new(),
            alternatives,
            compatible_with,
            requires_setup,
            provides_setup_for,
            available_sources: Vec::new(),
            active_source: None,
        }
    }
}

/// Convenience wrapper around [`GraphBuilder`].
#[must_use]
pub fn build_catalog(
    skills: Vec<RawSkill>,
    agents: Vec<AgentDefinition>,
    rules: &RelationshipRules,
    ctx: &ExtractionContext,
) -> Catalog {
    GraphBuilder::new(&skills, rules).build(skills, agents, ctx)
}

fn push_relation(list: &mut Vec<SkillRelation>, owner: &str, target: String, reason: &str) {
    if target == owner || list.iter().any(|r| r.skill_id == target) {
        return;
    }
    list.push(SkillRelation::new(target, reason));
}

fn push_group(list: &mut Vec<RequireGroup>, group: RequireGroup) {
    let mut key = group.skill_ids.clone();
    key.sort();
    let duplicate = list.iter().any(|g| {
        let mut existing = g.skill_ids.clone();
        existing.sort();
        existing == key && g.needs_any == group.needs_any
    });
    if !duplicate {
        list.push(group);
    }
}

/// Populate `recommended_by` and `required_by` on target skills.
fn compute_inverse_edges(skills: &mut BTreeMap<String, ResolvedSkill>) {
    let mut recommended_by: Vec<(String, SkillRelation)> = Vec::new();
    let mut required_by: Vec<(String, SkillRelation)> = Vec::new();

    for skill in skills.values() {
        for rec in &skill.recommends {
            recommended_by.push((
                rec.skill_id.clone(),
                SkillRelation::new(skill.id.clone(), rec.reason.clone()),
            ));
        }
        for group in &skill.requires {
            for target in &group.skill_ids {
                required_by.push((
                    target.clone(),
                    SkillRelation::new(skill.id.clone(), group.reason.clone()),
                ));
            }
        }
    }

    for (target, relation) in recommended_by {
        if let Some(skill) = skills.get_mut(&target) {
            let owner = skill.id.clone();
            push_relation(&mut skill.recommended_by, &owner, relation.skill_id, &relation.reason);
        }
    }
    for (target, relation) in required_by {
        if let Some(skill) = skills.get_mut(&target) {
            let owner = skill.id.clone();
            push_relation(&mut skill.required_by, &owner, relation.skill_id, &relation.reason);
        }
    }
}

fn report_dangling(skills: &BTreeMap<String, ResolvedSkill>) {
    for skill in skills.values() {
        for target in skill.outgoing_references() {
            if !skills.contains_key(target) {
                warn!(skill = %skill.id, reference = %target, "unresolved skill reference");
            }
        }
    }
}
