use std::collections::BTreeMap;

use proptest::prelude::*;

use skillsmith::catalog::IdResolver;

fn skill_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,4}(/[a-z]{1,4}){0,2}", 1..12)
        .prop_map(|ids| ids.into_iter().collect())
}

proptest! {
    #[test]
    fn test_resolve_is_idempotent(
        ids in skill_ids(),
        alias_keys in prop::collection::vec("[a-z-]{1,8}", 0..6),
        queries in prop::collection::vec("[a-z/ -]{0,12}", 0..12),
    ) {
        let dirs: Vec<String> = ids.iter().map(|id| format!("src/{id}")).collect();
        let aliases: BTreeMap<String, String> = alias_keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), ids[i % ids.len()].clone()))
            .collect();
        let resolver = IdResolver::new(
            ids.iter().map(String::as_str).zip(dirs.iter().map(String::as_str)),
            &aliases,
        );

        let references = ids
            .iter()
            .chain(&dirs)
            .chain(aliases.keys())
            .chain(&queries);
        for reference in references {
            let once = resolver.resolve(reference, "property");
            let twice = resolver.resolve(&once, "property");
            prop_assert_eq!(&once, &twice, "reference {:?}", reference);
        }
    }

    #[test]
    fn test_canonical_ids_resolve_to_themselves(ids in skill_ids()) {
        let resolver = IdResolver::new(ids.iter().map(|id| (id.as_str(), "")), &BTreeMap::new());
        for id in &ids {
            prop_assert_eq!(resolver.resolve(id, "property"), id.clone());
        }
    }
}
