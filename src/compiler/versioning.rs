//! Content hashing and version decisions for compiled output.
//!
//! Only "no change" or a major bump exist. Any change to the hashed
//! content bumps the major component and resets minor and patch.

use semver::Version;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Result, SmithError};

pub const DEFAULT_VERSION: &str = "1.0.0";

/// Stable hash over name, description and the sorted, deduplicated skill
/// and agent ID sets. Order and cosmetic fields do not affect it.
///
/// Every field is length-prefixed so adjacent values cannot run together.
pub fn content_hash<'a, S, A>(name: &str, description: &str, skills: S, agents: A) -> String
where
    S: IntoIterator<Item = &'a str>,
    A: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    update_field(&mut hasher, name);
    update_field(&mut hasher, description);
    update_set(&mut hasher, skills);
    update_set(&mut hasher, agents);
    hex::encode(hasher.finalize())
}

fn update_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn update_set<'a>(hasher: &mut Sha256, values: impl IntoIterator<Item = &'a str>) {
    let mut values: Vec<&str> = values.into_iter().collect();
    values.sort_unstable();
    values.dedup();
    hasher.update((values.len() as u64).to_le_bytes());
    for value in values {
        update_field(hasher, value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VersionDecision {
    Initial { version: String },
    Unchanged { version: String },
    MajorBump { from: String, version: String },
}

impl VersionDecision {
    #[must_use]
    pub fn version(&self) -> &str {
        match self {
            Self::Initial { version }
            | Self::Unchanged { version }
            | Self::MajorBump { version, .. } => version,
        }
    }
}

/// Decide the version from the prior manifest (version and stored hash)
/// and the new hash. A prior manifest without a stored hash counts as
/// changed.
pub fn next_version(prior: Option<(&str, Option<&str>)>, new_hash: &str) -> Result<VersionDecision> {
    let Some((version, prior_hash)) = prior else {
        return Ok(VersionDecision::Initial {
            version: DEFAULT_VERSION.to_string(),
        });
    };
    if prior_hash == Some(new_hash) {
        return Ok(VersionDecision::Unchanged {
            version: version.to_string(),
        });
    }
    Ok(VersionDecision::MajorBump {
        from: version.to_string(),
        version: bump_major(version)?,
    })
}

pub fn bump_major(version: &str) -> Result<String> {
    let current = Version::parse(version.trim()).map_err(|err| {
        SmithError::ValidationFailed(format!("manifest version must be valid semver: {err}"))
    })?;
    Ok(Version::new(current.major + 1, 0, 0).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_fields_do_not_run_together() {
        assert_ne!(
            content_hash("ab", "c", ["x"], ["y"]),
            content_hash("a", "bc", ["x"], ["y"])
        );
        assert_ne!(
            content_hash("p", "d", ["x", "y"], Vec::<&str>::new()),
            content_hash("p", "d", ["x"], ["y"])
        );
    }

    #[test]
    fn hash_ignores_order_and_duplicates() {
        let a = content_hash("p", "d", ["b", "a", "a"], ["x"]);
        let b = content_hash("p", "d", ["a", "b"], ["x"]);
        assert_eq!(a, b);
        assert_ne!(a, content_hash("p", "d", ["a", "b", "c"], ["x"]));
        assert_ne!(a, content_hash("p", "other", ["a", "b"], ["x"]));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn decisions() {
        assert_eq!(
            next_version(None, "h").unwrap(),
            VersionDecision::Initial {
                version: "1.0.0".into()
            }
        );
        assert_eq!(
            next_version(Some(("1.0.0", Some("h"))), "h").unwrap().version(),
            "1.0.0"
        );
        assert_eq!(
            next_version(Some(("1.4.2", Some("old"))), "h").unwrap(),
            VersionDecision::MajorBump {
                from: "1.4.2".into(),
                version: "2.0.0".into()
            }
        );
        assert_eq!(
            next_version(Some(("3.0.0", None)), "h").unwrap().version(),
            "4.0.0"
        );
    }

    #[test]
    fn invalid_prior_version_fails() {
        assert!(bump_major("not-a-version").is_err());
    }
}
