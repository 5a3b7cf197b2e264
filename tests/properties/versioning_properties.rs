use proptest::prelude::*;

use skillsmith::compiler::{VersionDecision, content_hash, next_version};

proptest! {
    #[test]
    fn test_hash_ignores_order(
        skills in prop::collection::vec("[a-z-]{1,10}", 0..10),
        agents in prop::collection::vec("[a-z-]{1,10}", 0..5),
    ) {
        let forward = content_hash(
            "plugin",
            "desc",
            skills.iter().map(String::as_str),
            agents.iter().map(String::as_str),
        );
        let backward = content_hash(
            "plugin",
            "desc",
            skills.iter().rev().map(String::as_str),
            agents.iter().rev().map(String::as_str),
        );
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn test_changed_hash_bumps_major_only(major in 0u64..1000, minor in 0u64..50, patch in 0u64..50) {
        let prior = format!("{major}.{minor}.{patch}");
        let decision = next_version(Some((prior.as_str(), Some("old"))), "new").unwrap();
        prop_assert_eq!(
            decision,
            VersionDecision::MajorBump { from: prior.clone(), version: format!("{}.0.0", major + 1) }
        );
        let same = next_version(Some((prior.as_str(), Some("new"))), "new").unwrap();
        prop_assert_eq!(same.version(), prior.as_str());
    }
}
