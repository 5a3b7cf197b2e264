//! E2E Scenario: compile a stack and a compile config into a plugin,
//! recompile, and check the version decisions.

use skillsmith::compiler::{
    CompileInput, CompileReport, CompileRequest, MarkdownRenderer, PluginManifest,
    VersionDecision, compile_project,
};
use skillsmith::project::ProjectConfig;
use skillsmith::sources::LoadedCatalog;
use skillsmith::stack::CompileConfig;
use tempfile::TempDir;

use super::common::{load, primary_source};

struct Workspace {
    project: TempDir,
    output: TempDir,
    cache: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            project: TempDir::new().unwrap(),
            output: TempDir::new().unwrap(),
            cache: TempDir::new().unwrap(),
        }
    }

    fn compile(&self, loaded: &LoadedCatalog, input: CompileInput) -> skillsmith::Result<CompileReport> {
        compile_project(&CompileRequest {
            loaded,
            input,
            project_dir: self.project.path().to_path_buf(),
            output_dir: self.output.path().to_path_buf(),
            author: Some("Test Author".to_string()),
            keywords: vec!["web".to_string()],
            renderer: &MarkdownRenderer,
        })
    }

    fn read_output(&self, relative: &str) -> String {
        std::fs::read_to_string(self.output.path().join(relative)).unwrap()
    }
}

fn explicit_config(yaml: &str) -> CompileInput {
    CompileInput::Config(CompileConfig::from_yaml_str(yaml).unwrap())
}

#[test]
fn stack_compile_writes_plugin_and_versions_by_content() {
    let source = primary_source();
    let ws = Workspace::new();
    let loaded = load(&source.url(), Vec::new(), ws.project.path(), ws.cache.path()).unwrap();

    let first = ws.compile(&loaded, CompileInput::Stack("react-app".into())).unwrap();
    assert_eq!(
        first.version,
        VersionDecision::Initial {
            version: "1.0.0".into()
        }
    );
    assert_eq!(first.agents.len(), 2);

    let developer = ws.read_output("agents/web-developer.md");
    assert!(developer.starts_with("---\nname: web-developer\n"));
    assert!(developer.contains("### web-framework-react"));
    assert!(developer.contains("### web-styling-scss-modules"));
    assert!(!developer.contains("web-testing-vitest"));

    let tester = ws.read_output("agents/web-tester.md");
    assert!(tester.contains("### web-testing-vitest"));

    assert!(ws.output.path().join("skills/web-framework-react/SKILL.md").is_file());
    assert!(ws.output.path().join("skills/web-testing-vitest/SKILL.md").is_file());

    let manifest = PluginManifest::load(ws.output.path()).unwrap().unwrap();
    assert_eq!(manifest.name, "react-app");
    assert_eq!(manifest.version, "1.0.0");
    assert_eq!(manifest.keywords, vec!["web"]);
    assert_eq!(manifest.content_hash.as_deref(), Some(first.content_hash.as_str()));

    let project = ProjectConfig::load(&ProjectConfig::path_in(ws.project.path()))
        .unwrap()
        .unwrap();
    assert_eq!(project.philosophy.as_deref(), Some("Small components, tested in isolation"));
    assert!(project.skill_ids().any(|id| id == "web-styling-scss-modules"));

    let again = ws.compile(&loaded, CompileInput::Stack("react-app".into())).unwrap();
    assert_eq!(
        again.version,
        VersionDecision::Unchanged {
            version: "1.0.0".into()
        }
    );
    assert_eq!(again.content_hash, first.content_hash);

    let changed = ws
        .compile(
            &loaded,
            explicit_config(
                "name: react-app\ndescription: React with SCSS modules and Vitest\nagents:\n  web-developer:\n    skills: [react]\n",
            ),
        )
        .unwrap();
    assert_eq!(
        changed.version,
        VersionDecision::MajorBump {
            from: "1.0.0".into(),
            version: "2.0.0".into()
        }
    );
    assert!(ws.read_output(".claude-plugin/plugin.json").contains("\"2.0.0\""));
    // Output directories are rebuilt on every run.
    assert!(!ws.output.path().join("agents/web-tester.md").exists());
}

#[test]
fn explicit_preloaded_skill_replaces_default_mapping() {
    let source = primary_source();
    let ws = Workspace::new();
    let loaded = load(&source.url(), Vec::new(), ws.project.path(), ws.cache.path()).unwrap();

    let report = ws
        .compile(
            &loaded,
            explicit_config(
                r"
name: explicit
agents:
  web-developer:
    skills:
      - id: web-testing-vitest
        preloaded: true
  web-tester: {}
",
            ),
        )
        .unwrap();

    let developer = ws.read_output("agents/web-developer.md");
    assert!(developer.contains("## Preloaded Skills\n\n### web-testing-vitest"));
    assert!(!developer.contains("web-framework-react"));
    assert!(!developer.contains("web-styling-scss-modules"));

    let tester = report.agents.iter().find(|a| a.name == "web-tester").unwrap();
    assert_eq!(tester.preloaded, vec!["web-testing-vitest"]);
    assert!(tester.dynamic.is_empty());
}

#[test]
fn existing_project_config_wins_on_merge() {
    let source = primary_source();
    let ws = Workspace::new();
    let path = ProjectConfig::path_in(ws.project.path());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        "name: keep-me\nskills: [my-own-skill]\nhooks:\n  pre-commit: lint\n",
    )
    .unwrap();
    let loaded = load(&source.url(), Vec::new(), ws.project.path(), ws.cache.path()).unwrap();

    let report = ws.compile(&loaded, CompileInput::Stack("react-app".into())).unwrap();
    assert!(report.merged_existing_config);

    let merged = ProjectConfig::load(&path).unwrap().unwrap();
    assert_eq!(merged.name.as_deref(), Some("keep-me"));
    let ids: Vec<&str> = merged.skill_ids().collect();
    assert_eq!(ids[0], "my-own-skill");
    assert!(ids.contains(&"web-framework-react"));
    assert!(merged.hooks.contains_key("pre-commit"));
}

#[test]
fn unknown_agent_and_stack_are_not_found() {
    let source = primary_source();
    let ws = Workspace::new();
    let loaded = load(&source.url(), Vec::new(), ws.project.path(), ws.cache.path()).unwrap();

    let err = ws
        .compile(&loaded, explicit_config("name: x\nagents:\n  ghost-agent: {}\n"))
        .unwrap_err();
    assert_eq!(err.code(), "not_found");

    let err = ws
        .compile(&loaded, CompileInput::Stack("missing".into()))
        .unwrap_err();
    assert_eq!(err.code(), "not_found");
    assert!(!ws.output.path().join(".claude-plugin").exists());
}

#[test]
fn failed_compile_leaves_previous_output_untouched() {
    let source = primary_source();
    let ws = Workspace::new();
    let loaded = load(&source.url(), Vec::new(), ws.project.path(), ws.cache.path()).unwrap();
    ws.compile(&loaded, CompileInput::Stack("react-app".into())).unwrap();

    let config_path = ProjectConfig::path_in(ws.project.path());
    let edited = format!(
        "# hand edited\n{}",
        std::fs::read_to_string(&config_path).unwrap()
    );
    std::fs::write(&config_path, &edited).unwrap();
    std::fs::remove_file(source.path().join("agents/web-tester/intro.md")).unwrap();

    let err = ws
        .compile(&loaded, CompileInput::Stack("react-app".into()))
        .unwrap_err();
    assert_eq!(err.code(), "not_found");

    assert_eq!(std::fs::read_to_string(&config_path).unwrap(), edited);
    assert!(ws.output.path().join("agents/web-developer.md").is_file());
    assert!(ws.output.path().join("agents/web-tester.md").is_file());
    assert!(ws.output.path().join("skills/web-framework-react/SKILL.md").is_file());
    assert!(ws.output.path().join("skills/web-testing-vitest/SKILL.md").is_file());
    let manifest = PluginManifest::load(ws.output.path()).unwrap().unwrap();
    assert_eq!(manifest.version, "1.0.0");
}

#[test]
fn conflicting_selection_is_reported_not_fatal() {
    let source = primary_source();
    let ws = Workspace::new();
    let loaded = load(&source.url(), Vec::new(), ws.project.path(), ws.cache.path()).unwrap();

    let report = ws
        .compile(
            &loaded,
            explicit_config("name: both\nagents:\n  web-developer:\n    skills: [react, vue]\n"),
        )
        .unwrap();
    assert!(!report.warnings.is_empty());
    assert!(report.warnings.iter().any(|w| w.skill_id == "web-framework-react"
        || w.skill_id == "web-framework-vue"));
}
