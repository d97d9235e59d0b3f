use crate::api::BinderApi;
use crate::project::Project;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway project directory on the real filesystem.
pub struct TestEnv {
    // Kept so the directory lives until the test is done.
    pub _temp_dir: TempDir,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn project(&self) -> Project {
        Project::open(&self.root).expect("failed to open project")
    }

    pub fn api(&self) -> BinderApi {
        BinderApi::new(self.project())
    }

    pub fn write(&self, name: &str, content: &str) {
        fs::write(self.root.join(name), content).expect("failed to write file");
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.root.join(name)).expect("failed to read file")
    }

    /// Visible Markdown files, sorted.
    pub fn markdown_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.root)
            .expect("failed to read dir")
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|n| n.ends_with(".md") && !n.starts_with('.'))
            .collect();
        names.sort();
        names
    }
}
