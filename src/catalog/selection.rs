//! Selection validation against the resolved catalog.

use std::collections::BTreeMap;

use serde::Serialize;

use super::alias::IdResolver;
use super::types::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Conflict,
    MissingRequirement,
    ExclusiveCategory,
    UnknownSkill,
    Discouraged,
    Recommendation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionIssue {
    pub kind: IssueKind,
    pub skill_id: String,
    /// Other skills involved, if any.
    pub related: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionReport {
    /// The selection after reference resolution and deduplication.
    pub selected: Vec<String>,
    pub errors: Vec<SelectionIssue>,
    pub warnings: Vec<SelectionIssue>,
    pub suggestions: Vec<SelectionIssue>,
}

impl SelectionReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a set of skill references.
///
/// Conflicts, unmet requirements, exclusive-category violations and
/// unknown IDs are errors. Discouraged pairs are warnings. Recommendations
/// of unselected skills are suggestions.
#[must_use]
pub fn validate_selection(catalog: &Catalog, references: &[String]) -> SelectionReport {
    let resolver = IdResolver::from_catalog(catalog);
    let mut selected: Vec<String> = Vec::new();
    for reference in references {
        let id = resolver.resolve(reference, "selection");
        if !selected.contains(&id) {
            selected.push(id);
        }
    }
    let selected_refs: Vec<&str> = selected.iter().map(String::as_str).collect();

    let mut report = SelectionReport::default();
    let mut by_exclusive_category: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for id in &selected {
        let Some(skill) = catalog.get(id) else {
            report.errors.push(SelectionIssue {
                kind: IssueKind::UnknownSkill,
                skill_id: id.clone(),
                related: Vec::new(),
                message: format!("unknown skill `{id}`"),
            });
            continue;
        };

        for conflict in &skill.conflicts_with {
            // Report each symmetric pair once.
            let reported = report.errors.iter().any(|e| {
                e.kind == IssueKind::Conflict
                    && e.skill_id == conflict.skill_id
                    && e.related.contains(id)
            });
            if selected.contains(&conflict.skill_id) && !reported {
                report.errors.push(SelectionIssue {
                    kind: IssueKind::Conflict,
                    skill_id: id.clone(),
                    related: vec![conflict.skill_id.clone()],
                    message: format!(
                        "`{id}` conflicts with `{}`: {}",
                        conflict.skill_id, conflict.reason
                    ),
                });
            }
        }

        for group in &skill.requires {
            if !group.is_satisfied_by(&selected_refs) {
                let mode = if group.needs_any { "one of" } else { "all of" };
                report.errors.push(SelectionIssue {
                    kind: IssueKind::MissingRequirement,
                    skill_id: id.clone(),
                    related: group.skill_ids.clone(),
                    message: format!(
                        "`{id}` requires {mode} [{}]: {}",
                        group.skill_ids.join(", "),
                        group.reason
                    ),
                });
            }
        }

        for discouraged in &skill.discourages {
            let reported = report.warnings.iter().any(|w| {
                w.skill_id == discouraged.skill_id && w.related.contains(id)
            });
            if selected.contains(&discouraged.skill_id) && !reported {
                report.warnings.push(SelectionIssue {
                    kind: IssueKind::Discouraged,
                    skill_id: id.clone(),
                    related: vec![discouraged.skill_id.clone()],
                    message: format!(
                        "`{id}` with `{}` is discouraged: {}",
                        discouraged.skill_id, discouraged.reason
                    ),
                });
            }
        }

        for rec in &skill.recommends {
            let already = report
                .suggestions
                .iter()
                .any(|s| s.skill_id == rec.skill_id);
            if !selected.contains(&rec.skill_id) && !already {
                report.suggestions.push(SelectionIssue {
                    kind: IssueKind::Recommendation,
                    skill_id: rec.skill_id.clone(),
                    related: vec![id.clone()],
                    message: format!("`{id}` recommends `{}`: {}", rec.skill_id, rec.reason),
                });
            }
        }

        let exclusive = skill.category_exclusive
            || catalog
                .categories
                .get(&skill.category)
                .is_some_and(|c| c.exclusive);
        if exclusive {
            by_exclusive_category
                .entry(skill.category.as_str())
                .or_default()
                .push(id.as_str());
        }
    }

    for (category, ids) in by_exclusive_category {
        if ids.len() > 1 {
            report.errors.push(SelectionIssue {
                kind: IssueKind::ExclusiveCategory,
                skill_id: ids[0].to_string(),
                related: ids[1..].iter().map(ToString::to_string).collect(),
                message: format!(
                    "category `{category}` allows one skill, selected: {}",
                    ids.join(", ")
                ),
            });
        }
    }

    report.selected = selected;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{catalog_with_rules, raw_skill};

    fn catalog() -> Catalog {
        catalog_with_rules(
            vec![
                raw_skill("web/framework/react", "web/framework"),
                raw_skill("web/framework/vue", "web/framework"),
                raw_skill("redux", "web/styling"),
                raw_skill("zustand", "web/styling"),
                raw_skill("vitest", "web/testing"),
                raw_skill("nextjs", "web/meta-framework"),
            ],
            r"
relationships:
  conflicts:
    - skills: [web/framework/react, web/framework/vue]
      reason: one framework
  discourages:
    - skills: [redux, zustand]
      reason: pick one store
  recommends:
    - when: web/framework/react
      suggest: [vitest]
      reason: fast tests
  requires:
    - skill: nextjs
      needs: [web/framework/react]
      reason: built on react
",
        )
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn clean_selection_has_suggestions_only() {
        let report = validate_selection(&catalog(), &ids(&["react"]));
        assert!(report.is_valid());
        assert_eq!(report.selected, vec!["web/framework/react"]);
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.suggestions[0].skill_id, "vitest");
    }

    #[test]
    fn conflict_reported_once_with_exclusive_violation() {
        let report = validate_selection(
            &catalog(),
            &ids(&["web/framework/react", "web/framework/vue"]),
        );
        let conflicts: Vec<_> = report
            .errors
            .iter()
            .filter(|e| e.kind == IssueKind::Conflict)
            .collect();
        assert_eq!(conflicts.len(), 1);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.kind == IssueKind::ExclusiveCategory)
        );
    }

    #[test]
    fn unmet_requirement_and_unknown_are_errors() {
        let report = validate_selection(&catalog(), &ids(&["nextjs", "angular"]));
        let kinds: Vec<_> = report.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![IssueKind::MissingRequirement, IssueKind::UnknownSkill]
        );
    }

    #[test]
    fn discouraged_pair_is_a_warning() {
        let report = validate_selection(&catalog(), &ids(&["redux", "zustand"]));
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, IssueKind::Discouraged);
    }
}
