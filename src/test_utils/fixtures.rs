use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A source tree (skills, agents, rule set, stacks) in a temp directory.
pub struct SourceFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl Default for SourceFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Source URL for the fixture (its local path).
    #[must_use]
    pub fn url(&self) -> String {
        self.root.display().to_string()
    }

    /// Write a file relative to the fixture root.
    pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
        write_under(&self.root, relative_path, content)
    }

    /// Add `skills/<dir>/SKILL.md` and `metadata.yaml`.
    pub fn add_skill(&self, dir: &str, id: &str, metadata: &str) -> PathBuf {
        self.add_skill_with_body(dir, id, metadata, &format!("# {id}\n\nGuidance for {id}.\n"))
    }

    pub fn add_skill_with_body(&self, dir: &str, id: &str, metadata: &str, body: &str) -> PathBuf {
        let skill_dir = self.root.join("skills").join(dir);
        write_skill_files(&skill_dir, id, Some(metadata), body);
        skill_dir
    }

    /// Add `agents/<id>/` with metadata and the required fragments.
    pub fn add_agent(&self, id: &str, title: &str) -> PathBuf {
        let dir = format!("agents/{id}");
        self.write_file(
            &format!("{dir}/metadata.yaml"),
            &format!("id: {id}\ntitle: {title}\ndescription: {title} agent\ntools: [Read, Write]\n"),
        );
        self.write_file(&format!("{dir}/intro.md"), &format!("You are the {title}."));
        self.write_file(&format!("{dir}/workflow.md"), "1. Understand\n2. Implement\n3. Verify");
        self.root.join(dir)
    }

    pub fn write_matrix(&self, yaml: &str) -> PathBuf {
        self.write_file("config/skills-matrix.yaml", yaml)
    }

    pub fn write_stacks(&self, yaml: &str) -> PathBuf {
        self.write_file("config/stacks.yaml", yaml)
    }

    pub fn write_mappings(&self, yaml: &str) -> PathBuf {
        self.write_file("config/agent-mappings.yaml", yaml)
    }
}

/// A project directory with installed skill copies.
pub struct ProjectFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Add `.claude/skills/<dir>/SKILL.md` with optional metadata.
    pub fn add_local_skill(&self, dir: &str, id: &str, metadata: Option<&str>) -> PathBuf {
        let skill_dir = self.root.join(".claude/skills").join(dir);
        write_skill_files(&skill_dir, id, metadata, &format!("# {id} (local)\n"));
        skill_dir
    }

    /// Add `.claude/plugins/<plugin>/skills/<dir>/SKILL.md`.
    pub fn add_plugin_skill(&self, plugin: &str, dir: &str, id: &str) -> PathBuf {
        let skill_dir = self
            .root
            .join(".claude/plugins")
            .join(plugin)
            .join("skills")
            .join(dir);
        write_skill_files(&skill_dir, id, None, &format!("# {id} (plugin)\n"));
        skill_dir
    }
}

fn write_skill_files(skill_dir: &Path, id: &str, metadata: Option<&str>, body: &str) {
    let skill_md = format!("---\nname: {id}\ndescription: {id} skill\n---\n\n{body}");
    write_under(skill_dir, "SKILL.md", &skill_md);
    if let Some(metadata) = metadata {
        write_under(skill_dir, "metadata.yaml", metadata);
    }
}

fn write_under(base: &Path, relative_path: &str, content: &str) -> PathBuf {
    let full_path = base.join(relative_path);
    if let Some(parent) = full_path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    std::fs::write(&full_path, content).expect("Failed to write file");
    full_path
}
