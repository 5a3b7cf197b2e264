//! Common helpers shared by the integration suites.

#![allow(dead_code)]

use std::path::Path;

use skillsmith::Result;
use skillsmith::sources::{
    CatalogLoader, ExtraSource, GitSourceFetcher, LoadOptions, LoadedCatalog,
    SourceMarketplaceFetcher,
};
use skillsmith::test_utils::fixtures::SourceFixture;

pub const MATRIX: &str = r#"
version: "1.0.0"
relationships:
  conflicts:
    - skills: [react, vue]
      reason: Pick one component framework
  recommends:
    - when: react
      suggest: [vitest]
      reason: Vitest fits the React toolchain
skill_aliases:
  react: web-framework-react
  vue: web-framework-vue
  scss-modules: web-styling-scss-modules
  vitest: web-testing-vitest
per_skill:
  web-framework-react:
    usage_guidance: Use when building React components
"#;

pub const STACKS: &str = r#"
stacks:
  - id: react-app
    name: React App
    description: React with SCSS modules and Vitest
    philosophy: Small components, tested in isolation
    agents:
      web-developer:
        framework: react
        styling: { id: scss-modules, preloaded: true }
      web-tester:
        testing: [vitest]
"#;

/// Primary source with four web skills, two agents, a rule set and one stack.
pub fn primary_source() -> SourceFixture {
    let source = SourceFixture::new();
    source.add_skill(
        "web/framework/react",
        "web-framework-react",
        "category: web/framework\ncategory_exclusive: true\ntags: [ui]\n",
    );
    source.add_skill(
        "web/framework/vue",
        "web-framework-vue",
        "category: web/framework\ncategory_exclusive: true\n",
    );
    source.add_skill(
        "web/styling/scss-modules",
        "web-styling-scss-modules",
        "category: web/styling\n",
    );
    source.add_skill(
        "web/testing/vitest",
        "web-testing-vitest",
        "category: web/testing\n",
    );
    source.add_agent("web-developer", "Web Developer");
    source.add_agent("web-tester", "Web Tester");
    source.write_matrix(MATRIX);
    source.write_stacks(STACKS);
    source
}

pub fn load(
    primary: &str,
    extras: Vec<ExtraSource>,
    project_dir: &Path,
    cache_dir: &Path,
) -> Result<LoadedCatalog> {
    let fetcher = GitSourceFetcher::new(cache_dir);
    let marketplace = SourceMarketplaceFetcher::new(&fetcher);
    CatalogLoader::new(&fetcher, &marketplace).load(&LoadOptions {
        primary: primary.to_string(),
        marketplace_name: None,
        extras,
        project_dir: Some(project_dir.to_path_buf()),
        force_refresh: false,
    })
}
