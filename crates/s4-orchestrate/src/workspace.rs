//! Workspace and build-directory state
//!
//! A workspace is a directory holding one checked-out project, marked by
//! `.s4-workspace.toml`. A build directory is marked by `.s4-build.toml`,
//! which records the selection it was configured with (not the resolved
//! table) so that reconfiguring re-resolves against the current catalogue.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::path::{Component, Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use s4_catalogue::easy_settings;
use s4_core::{ProjectDescriptor, Selection};

use crate::error::{Error, Result};

/// Directory within the workspace root used as the seL4 build cache
pub const CACHE_DIR: &str = ".sel4_cache";

/// Contents of `.s4-workspace.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkspaceState {
    pub project: String,
    /// Build directories relative to the workspace root
    #[serde(default)]
    pub builds: BTreeSet<PathBuf>,
}

impl WorkspaceState {
    pub const FILENAME: &'static str = ".s4-workspace.toml";
}

/// Contents of `.s4-build.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildState {
    /// Workspace root relative to the build directory
    pub workspace_root: PathBuf,
    pub selection: Selection,
}

impl BuildState {
    pub const FILENAME: &'static str = ".s4-build.toml";
}

fn load_state<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    toml::from_str(&content).map_err(|source| Error::StateParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write through a temporary file under an exclusive lock
fn save_state<T: Serialize>(state: &T, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(state)?;

    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    lock_file.lock_exclusive().map_err(|e| Error::io(path, e))?;

    let temp_path = path.with_extension("toml.tmp");
    fs::write(&temp_path, &content).map_err(|e| Error::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Create `path`, or accept it if it is an empty directory
fn create_empty_dir(path: &Path, not_empty: impl FnOnce(PathBuf) -> Error) -> Result<()> {
    if path.is_dir() {
        let mut entries = fs::read_dir(path).map_err(|e| Error::io(path, e))?;
        if entries.next().is_some() {
            return Err(not_empty(path.to_path_buf()));
        }
    } else if path.exists() {
        return Err(Error::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Path leading from directory `from` to `to`, both resolved first
pub fn relative_path(from: &Path, to: &Path) -> Result<PathBuf> {
    let from = from.canonicalize().map_err(|e| Error::io(from, e))?;
    let to = to.canonicalize().map_err(|e| Error::io(to, e))?;

    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut result = PathBuf::new();
    for _ in common..from.len() {
        result.push("..");
    }
    for component in &to[common..] {
        result.push(component);
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    Ok(result)
}

/// An initialised workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    state: WorkspaceState,
}

impl Workspace {
    /// Create a workspace directory for `project`
    ///
    /// The directory must not exist yet or be empty.
    pub fn create(project: &str, path: &Path) -> Result<Self> {
        create_empty_dir(path, |path| Error::WorkspaceNotEmpty { path })?;

        let cache = path.join(CACHE_DIR);
        fs::create_dir_all(&cache).map_err(|e| Error::io(&cache, e))?;

        let workspace = Self {
            root: path.to_path_buf(),
            state: WorkspaceState {
                project: project.to_string(),
                builds: BTreeSet::new(),
            },
        };
        workspace.save()?;
        tracing::info!(project, path = %path.display(), "Created workspace");
        Ok(workspace)
    }

    pub fn load(root: &Path) -> Result<Self> {
        let state = load_state(&root.join(WorkspaceState::FILENAME))?;
        Ok(Self {
            root: root.to_path_buf(),
            state,
        })
    }

    pub fn save(&self) -> Result<()> {
        save_state(&self.state, &self.root.join(WorkspaceState::FILENAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project(&self) -> &str {
        &self.state.project
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(CACHE_DIR)
    }

    /// Registered build directories that still exist, as absolute paths
    pub fn builds(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.state
            .builds
            .iter()
            .map(|build| self.root.join(build))
            .filter(|path| path.join(BuildState::FILENAME).is_file())
    }

    fn register_build(&mut self, build_root: &Path) -> Result<()> {
        let relative = relative_path(&self.root, build_root)?;
        if self.state.builds.insert(relative) {
            self.save()?;
        }
        Ok(())
    }

    /// Source directory of the project, relative to the workspace root
    ///
    /// The project's own declaration wins; otherwise the directory that
    /// `easy-settings.cmake` links into is used.
    pub fn source_directory(&self, project: &ProjectDescriptor) -> Result<PathBuf> {
        if let Some(source) = &project.source_directory {
            return Ok(source.clone());
        }
        easy_settings::inferred_source_directory(&self.root)?.ok_or_else(|| {
            Error::UnknownSourceDirectory {
                project: project.name.clone(),
                workspace: self.root.clone(),
            }
        })
    }
}

/// A configured build directory within a workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDirectory {
    root: PathBuf,
    workspace: Workspace,
    state: BuildState,
}

impl BuildDirectory {
    /// Create an empty build directory and register it with the workspace
    pub fn create(workspace: &Workspace, path: &Path, selection: Selection) -> Result<Self> {
        create_empty_dir(path, |path| Error::BuildNotEmpty { path })?;

        let mut workspace = workspace.clone();
        workspace.register_build(path)?;

        let build = Self {
            root: path.to_path_buf(),
            state: BuildState {
                workspace_root: relative_path(path, workspace.root())?,
                selection,
            },
            workspace,
        };
        build.save()?;
        tracing::info!(path = %path.display(), "Created build directory");
        Ok(build)
    }

    /// Load a build directory, finding its workspace through the recorded path
    pub fn load(root: &Path) -> Result<Self> {
        let state: BuildState = load_state(&root.join(BuildState::FILENAME))?;
        let workspace_root = root.join(&state.workspace_root);
        let workspace_root = workspace_root
            .canonicalize()
            .map_err(|e| Error::io(&workspace_root, e))?;
        let workspace = Workspace::load(&workspace_root)?;
        let build = Self {
            root: root.to_path_buf(),
            workspace,
            state,
        };
        build.check_project()?;
        Ok(build)
    }

    fn check_project(&self) -> Result<()> {
        if self.state.selection.project != self.workspace.project() {
            return Err(Error::ProjectMismatch {
                path: self.root.clone(),
                expected: self.workspace.project().to_string(),
                found: self.state.selection.project.clone(),
            });
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        save_state(&self.state, &self.root.join(BuildState::FILENAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    /// Replace the recorded selection, keeping the directory
    pub fn reselect(&mut self, selection: Selection) -> Result<()> {
        self.state.selection = selection;
        self.check_project()?;
        self.save()
    }

    /// Whether the build-system generator has already run here
    pub fn is_generated(&self) -> bool {
        self.root.join("CMakeCache.txt").is_file()
    }
}

/// Where s4 was started from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    Workspace(Workspace),
    Build(BuildDirectory),
}

impl Context {
    /// Walk up from `start` to the nearest build directory or workspace
    pub fn discover(start: &Path) -> Result<Option<Self>> {
        for dir in start.ancestors() {
            if dir.join(BuildState::FILENAME).is_file() {
                tracing::debug!(path = %dir.display(), "Found build directory");
                return BuildDirectory::load(dir).map(|b| Some(Self::Build(b)));
            }
            if dir.join(WorkspaceState::FILENAME).is_file() {
                tracing::debug!(path = %dir.display(), "Found workspace");
                return Workspace::load(dir).map(|w| Some(Self::Workspace(w)));
            }
        }
        Ok(None)
    }

    pub fn workspace(&self) -> &Workspace {
        match self {
            Self::Workspace(workspace) => workspace,
            Self::Build(build) => build.workspace(),
        }
    }

    pub fn build(&self) -> Option<&BuildDirectory> {
        match self {
            Self::Workspace(_) => None,
            Self::Build(build) => Some(build),
        }
    }

    pub fn into_workspace(self) -> Workspace {
        match self {
            Self::Workspace(workspace) => workspace,
            Self::Build(build) => build.workspace,
        }
    }
}
