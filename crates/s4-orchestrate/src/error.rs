//! Error types for s4-orchestrate

use std::path::PathBuf;

/// Result type for s4-orchestrate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or running external tools
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required program is not on `PATH`
    #[error("Could not find '{tool}' on PATH: {hint}")]
    ToolNotFound { tool: String, hint: &'static str },

    /// A program could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A program ran and reported failure
    #[error("{program} failed{}", exit_suffix(*.code))]
    ToolFailed { program: String, code: Option<i32> },

    #[error("Workspace directory {path} already exists and is not empty")]
    WorkspaceNotEmpty { path: PathBuf },

    #[error("Build directory {path} already exists and is not empty")]
    BuildNotEmpty { path: PathBuf },

    #[error("{path} exists and is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("Not inside an s4 workspace (searched upwards from {start})")]
    NoWorkspace { start: PathBuf },

    #[error("Not inside an s4 build directory (searched upwards from {start})")]
    NoBuildDirectory { start: PathBuf },

    #[error("Build directory {path} belongs to project '{found}', not '{expected}'")]
    ProjectMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// Neither the project nor `easy-settings.cmake` names the source directory
    #[error("Could not infer the source directory of project '{project}' in {workspace}")]
    UnknownSourceDirectory { project: String, workspace: PathBuf },

    #[error("Project '{project}' has no repository to check out")]
    NoRepository { project: String },

    /// A boot image the hardware run needs has not been built
    #[error("Image file missing: {path} (build the project first)")]
    ImageMissing { path: PathBuf },

    #[error("No root server image ending in '{suffix}' in {dir}")]
    NoRootServerImage { dir: PathBuf, suffix: String },

    #[error("No machine queue system matches {target}")]
    NoMatchingSystem { target: String },

    /// Every candidate system was tried and none reported success
    #[error("Could not run on any available system (tried {})", .tried.join(", "))]
    NoSystemSucceeded { tried: Vec<String> },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid state file {path}: {source}")]
    StateParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    StateSerialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Catalogue(#[from] s4_catalogue::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn exit_suffix(code: Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit status {}", code),
        None => " (terminated by signal)".to_string(),
    }
}
