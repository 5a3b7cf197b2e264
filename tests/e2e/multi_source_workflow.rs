//! E2E Scenario: one catalog assembled from a primary source, extra
//! sources, a local override and an installed plugin.

use skillsmith::catalog::ResolvedSkill;
use skillsmith::sources::{ExtraSource, LoadedCatalog};
use skillsmith::test_utils::fixtures::{ProjectFixture, SourceFixture};
use skillsmith::test_utils::logging::capture_logs;
use tempfile::TempDir;

use super::common::{load, primary_source};

fn extra_source(extra_skill: &str) -> SourceFixture {
    let source = SourceFixture::new();
    source.add_skill(
        "web/framework/react",
        "web-framework-react",
        "category: web/framework\n",
    );
    source.add_skill("web/testing/lint", extra_skill, "category: web/testing\n");
    source
}

fn source_names(skill: &ResolvedSkill) -> Vec<&str> {
    skill
        .available_sources
        .iter()
        .map(|s| s.name.as_str())
        .collect()
}

fn active_name(loaded: &LoadedCatalog, id: &str) -> String {
    loaded.catalog.get(id).unwrap().active_source.as_ref().unwrap().name.clone()
}

#[test]
fn installed_copies_take_precedence() {
    let primary = primary_source();
    primary.write_file(
        ".claude-plugin/marketplace.json",
        r#"{"name": "house-skills", "owner": {"name": "House"}, "plugins": []}"#,
    );
    let acme = extra_source("acme-testing-lint");
    let beta = extra_source("acme-testing-lint");
    let project = ProjectFixture::new();
    project.add_local_skill("react", "web-framework-react", None);
    project.add_plugin_skill("team-kit", "vitest", "web-testing-vitest");
    let cache = TempDir::new().unwrap();

    let loaded = load(
        &primary.url(),
        vec![
            ExtraSource {
                name: Some("acme".into()),
                url: acme.url(),
            },
            ExtraSource {
                name: Some("beta".into()),
                url: beta.url(),
            },
        ],
        project.path(),
        cache.path(),
    )
    .unwrap();
    assert_eq!(loaded.primary.name, "house-skills");

    let react = loaded.catalog.get("web-framework-react").unwrap();
    assert_eq!(source_names(react), vec!["house-skills", "acme", "beta", "local"]);
    let active = react.active_source.as_ref().unwrap();
    assert!(active.is_local_override());
    assert!(react.path.starts_with(project.path()));
    // Without its own metadata the override keeps the primary record.
    assert_eq!(react.category, "web/framework");

    let vitest = loaded.catalog.get("web-testing-vitest").unwrap();
    assert_eq!(source_names(vitest), vec!["house-skills", "team-kit"]);
    assert!(vitest.active_source.as_ref().unwrap().is_installed_plugin());

    // Ties between extras keep the first-listed one.
    assert_eq!(active_name(&loaded, "acme-testing-lint"), "acme");
    assert_eq!(active_name(&loaded, "web-framework-vue"), "house-skills");

    for skill in loaded.catalog.skills.values() {
        assert!(skill.active_source.is_some(), "{} untagged", skill.id);
    }
}

#[test]
fn local_override_with_metadata_redefines_skill() {
    let primary = primary_source();
    let project = ProjectFixture::new();
    project.add_local_skill(
        "react",
        "web-framework-react",
        Some("category: web/framework\ncategory_exclusive: true\ncli_description: House React conventions\ntags: [ui, house]\n"),
    );
    let cache = TempDir::new().unwrap();

    let loaded = load(&primary.url(), Vec::new(), project.path(), cache.path()).unwrap();

    let react = loaded.catalog.get("web-framework-react").unwrap();
    assert!(react.active_source.as_ref().unwrap().is_local_override());
    assert!(react.path.starts_with(project.path()));
    assert_eq!(react.description, "House React conventions");
    assert!(react.tags.iter().any(|t| t == "house"));
    // Path references written against the primary layout still resolve.
    assert_eq!(react.directory_path, "web/framework/react");
    assert!(react.conflicts_with.iter().any(|r| r.skill_id == "web-framework-vue"));

    let vue = loaded.catalog.get("web-framework-vue").unwrap();
    assert!(vue.active_source.as_ref().unwrap().primary);
    assert_eq!(vue.description, "web-framework-vue skill");
}

#[test]
fn failed_extra_source_is_skipped_with_warning() {
    let primary = primary_source();
    let project = ProjectFixture::new();
    let cache = TempDir::new().unwrap();
    let missing = cache.path().join("does-not-exist");

    let (loaded, logs) = capture_logs(|| {
        load(
            &primary.url(),
            vec![ExtraSource {
                name: None,
                url: missing.display().to_string(),
            }],
            project.path(),
            cache.path(),
        )
    });
    let loaded = loaded.unwrap();
    assert_eq!(loaded.catalog.skills.len(), 4);
    assert!(logs.contains_message("skipping extra source"));
}

#[test]
fn missing_primary_source_aborts() {
    let project = ProjectFixture::new();
    let cache = TempDir::new().unwrap();
    let missing = cache.path().join("nowhere");

    let err = load(&missing.display().to_string(), Vec::new(), project.path(), cache.path())
        .unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[test]
fn relationships_resolve_through_aliases() {
    let primary = primary_source();
    let project = ProjectFixture::new();
    let cache = TempDir::new().unwrap();
    let loaded = load(&primary.url(), Vec::new(), project.path(), cache.path()).unwrap();

    let react = loaded.catalog.get("web-framework-react").unwrap();
    assert!(react.conflicts_with.iter().any(|r| r.skill_id == "web-framework-vue"));
    assert!(react.recommends.iter().any(|r| r.skill_id == "web-testing-vitest"));
    assert_eq!(
        react.usage_guidance.as_deref(),
        Some("Use when building React components")
    );

    let vue = loaded.catalog.get("web-framework-vue").unwrap();
    assert!(vue.conflicts_with.iter().any(|r| r.skill_id == "web-framework-react"));

    let vitest = loaded.catalog.get("web-testing-vitest").unwrap();
    assert!(vitest.recommended_by.iter().any(|r| r.skill_id == "web-framework-react"));
    assert_eq!(loaded.catalog.aliases.get("react").map(String::as_str), Some("web-framework-react"));
}
