use proptest::prelude::*;

use skillsmith::project::{ProjectConfig, SkillEntry, merge_configs};

fn project_config() -> impl Strategy<Value = ProjectConfig> {
    (
        prop::option::of("[a-z]{1,8}"),
        prop::option::of("[a-z ]{0,16}"),
        prop::collection::vec("[a-z]{1,6}", 0..8),
        prop::collection::vec("[a-z]{1,6}", 0..4),
    )
        .prop_map(|(name, description, skills, agents)| ProjectConfig {
            name,
            description,
            skills: skills.into_iter().map(SkillEntry::Id).collect(),
            agents,
            ..ProjectConfig::default()
        })
}

proptest! {
    #[test]
    fn test_merge_leaves_inputs_untouched(incoming in project_config(), existing in project_config()) {
        let incoming_before = incoming.clone();
        let existing_before = existing.clone();
        let _ = merge_configs(&incoming, &existing);
        prop_assert_eq!(incoming, incoming_before);
        prop_assert_eq!(existing, existing_before);
    }

    #[test]
    fn test_existing_values_win(incoming in project_config(), existing in project_config()) {
        let merged = merge_configs(&incoming, &existing);

        prop_assert_eq!(&merged.name, &existing.name.clone().or_else(|| incoming.name.clone()));
        prop_assert_eq!(&merged.skills[..existing.skills.len()], &existing.skills[..]);
        prop_assert_eq!(&merged.agents[..existing.agents.len()], &existing.agents[..]);
        for entry in &incoming.skills {
            prop_assert!(merged.skills.iter().any(|s| s.id() == entry.id()));
        }
    }
}
