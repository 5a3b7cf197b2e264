//! Canonical-ID resolution.
//!
//! A skill can be referenced by its canonical ID, an alias from the rule
//! set, its directory path under the skills root, or its short form (the
//! last `/` segment of the ID, which usually carries the owner tag, e.g.
//! `react (@acme)`). Resolution order:
//!
//! 1. already-canonical ID (returned unchanged)
//! 2. alias table
//! 3. directory path
//! 4. short form / legacy alias target
//! 5. pass-through (logged at debug level with the calling context)

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::types::{Catalog, RawSkill};

/// How a reference was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Canonical,
    Alias,
    DirectoryPath,
    ShortForm,
}

#[derive(Debug, Clone, Default)]
pub struct IdResolver {
    known_ids: HashSet<String>,
    aliases: HashMap<String, String>,
    directory_paths: HashMap<String, String>,
    short_forms: HashMap<String, String>,
}

impl IdResolver {
    /// Build the lookup tables from `(id, directory_path)` pairs and the
    /// alias table.
    pub fn new<'a, I>(skills: I, aliases: &BTreeMap<String, String>) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut known_ids = HashSet::new();
        let mut directory_paths = HashMap::new();
        for (id, dir) in skills {
            known_ids.insert(id.to_string());
            if !dir.is_empty() && dir != id {
                directory_paths.insert(dir.to_string(), id.to_string());
            }
        }

        let short_forms = build_short_forms(&known_ids);

        // Alias targets that are not canonical IDs are legacy targets: find
        // the single catalog ID ending with `/<target>`.
        let mut resolved_aliases = HashMap::new();
        for (alias, target) in aliases {
            let canonical = if known_ids.contains(target) {
                target.clone()
            } else if let Some(id) = find_legacy_target(&known_ids, target) {
                debug!(alias = %alias, target = %target, id = %id, "legacy alias target remapped");
                id
            } else {
                target.clone()
            };
            resolved_aliases.insert(alias.clone(), canonical);
        }

        Self {
            known_ids,
            aliases: resolved_aliases,
            directory_paths,
            short_forms,
        }
    }

    pub fn from_raw_skills(skills: &[RawSkill], aliases: &BTreeMap<String, String>) -> Self {
        Self::new(
            skills
                .iter()
                .map(|s| (s.id.as_str(), s.directory_path.as_str())),
            aliases,
        )
    }

    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self::new(
            catalog
                .skills
                .values()
                .map(|s| (s.id.as_str(), s.directory_path.as_str())),
            &catalog.aliases,
        )
    }

    /// Look a reference up without falling back to pass-through.
    #[must_use]
    pub fn lookup(&self, reference: &str) -> Option<(&str, MatchKind)> {
        let reference = reference.trim();
        if let Some(id) = self.known_ids.get(reference) {
            return Some((id.as_str(), MatchKind::Canonical));
        }
        if let Some(id) = self.aliases.get(reference) {
            return Some((id.as_str(), MatchKind::Alias));
        }
        if let Some(id) = self.directory_paths.get(reference) {
            return Some((id.as_str(), MatchKind::DirectoryPath));
        }
        if let Some(id) = self.short_forms.get(reference) {
            return Some((id.as_str(), MatchKind::ShortForm));
        }
        None
    }

    /// Resolve a reference to a canonical ID. Unknown references pass
    /// through unchanged; `context` names where the reference came from.
    #[must_use]
    pub fn resolve(&self, reference: &str, context: &str) -> String {
        if let Some((id, _)) = self.lookup(reference) {
            return id.to_string();
        }
        debug!(reference = %reference, context = %context, "reference not found in any lookup table, passing through");
        reference.trim().to_string()
    }

    /// Resolve every reference in a list, preserving order.
    #[must_use]
    pub fn resolve_all(&self, references: &[String], context: &str) -> Vec<String> {
        references
            .iter()
            .map(|r| self.resolve(r, context))
            .collect()
    }

    pub fn known_ids(&self) -> impl Iterator<Item = &str> {
        self.known_ids.iter().map(String::as_str)
    }
}

fn short_form(id: &str) -> Option<&str> {
    id.rsplit_once('/').map(|(_, last)| last).filter(|s| !s.is_empty())
}

fn build_short_forms(known_ids: &HashSet<String>) -> HashMap<String, String> {
    let mut table: HashMap<String, String> = HashMap::new();
    let mut ambiguous: HashSet<String> = HashSet::new();
    for id in known_ids {
        let Some(short) = short_form(id) else {
            continue;
        };
        if known_ids.contains(short) || ambiguous.contains(short) {
            continue;
        }
        if let Some(previous) = table.remove(short) {
            debug!(short_form = %short, first = %previous, second = %id, "ambiguous short form dropped");
            ambiguous.insert(short.to_string());
        } else {
            table.insert(short.to_string(), id.clone());
        }
    }
    table
}

fn find_legacy_target(known_ids: &HashSet<String>, target: &str) -> Option<String> {
    let suffix = format!("/{target}");
    let mut matches = known_ids.iter().filter(|id| id.ends_with(&suffix));
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first.clone())
}
