//! [`TestWorkspace`] builder for s4 test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory standing in for an s4 workspace, with helpers for
/// writing catalogue overlays and checking produced files.
///
/// # Example
///
/// ```rust,no_run
/// use s4_test_utils::{TestWorkspace, fixtures};
///
/// let workspace = TestWorkspace::new();
/// let overlay = workspace.write_overlay("s4.toml", fixtures::SCENARIO);
/// workspace.assert_file_exists("s4.toml");
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel` inside the workspace.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write a catalogue overlay (or any file) and return its path.
    pub fn write_overlay(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Create a project source directory holding `easy-settings.cmake`, and
    /// link it from the workspace root the way checkouts do.
    pub fn add_source_dir(&self, rel: &str, easy_settings: &str) -> PathBuf {
        let source = self.path(rel);
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("easy-settings.cmake"), easy_settings).unwrap();
        fs::write(source.join("settings.cmake"), "").unwrap();

        let link = self.path("easy-settings.cmake");
        #[cfg(unix)]
        std::os::unix::fs::symlink(source.join("easy-settings.cmake"), &link).unwrap();
        #[cfg(not(unix))]
        fs::copy(source.join("easy-settings.cmake"), &link).unwrap();
        source
    }

    /// Assert that a file exists at `rel`.
    pub fn assert_file_exists(&self, rel: &str) {
        let path = self.path(rel);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// Assert that nothing exists at `rel`.
    pub fn assert_missing(&self, rel: &str) {
        let path = self.path(rel);
        assert!(!path.exists(), "Expected no file at: {}", path.display());
    }

    /// Read a file, panicking with context if it is missing.
    pub fn read(&self, rel: &str) -> String {
        let path = self.path(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
    }

    /// Assert that the file at `rel` contains `needle`.
    pub fn assert_file_contains(&self, rel: &str, needle: &str) {
        let content = self.read(rel);
        assert!(
            content.contains(needle),
            "Expected {} to contain {:?}, got:\n{}",
            rel,
            needle,
            content
        );
    }
}
