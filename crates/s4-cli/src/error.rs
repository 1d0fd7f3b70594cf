//! Error types for s4-cli

use colored::Colorize;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Process exit status for each class of failure; success is 0
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const LOAD: i32 = 2;
    pub const SELECTION: i32 = 3;
    pub const REQUIREMENTS: i32 = 4;
    pub const EXTERNAL_TOOL: i32 = 5;
}

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from s4-catalogue
    #[error(transparent)]
    Catalogue(#[from] s4_catalogue::Error),

    /// Error from s4-core
    #[error(transparent)]
    Core(#[from] s4_core::Error),

    /// Error from s4-orchestrate
    #[error(transparent)]
    Orchestrate(#[from] s4_orchestrate::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A selection option the command needs was not given
    #[error("Missing --{option}; it is needed to {purpose}")]
    MissingOption {
        option: &'static str,
        purpose: &'static str,
    },
}

impl From<s4_core::SelectionError> for CliError {
    fn from(e: s4_core::SelectionError) -> Self {
        Self::Core(e.into())
    }
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        use s4_core::Error as Core;
        use s4_orchestrate::Error as Orchestrate;

        match self {
            Self::Catalogue(e) => catalogue_exit_code(e),
            Self::Core(Core::Selection(_)) => exit_code::SELECTION,
            Self::Core(Core::Requirements(_)) => exit_code::REQUIREMENTS,
            Self::Core(Core::Json(_)) => exit_code::GENERAL,
            Self::Orchestrate(
                Orchestrate::ToolNotFound { .. }
                | Orchestrate::Spawn { .. }
                | Orchestrate::ToolFailed { .. }
                | Orchestrate::NoMatchingSystem { .. }
                | Orchestrate::NoSystemSucceeded { .. },
            ) => exit_code::EXTERNAL_TOOL,
            Self::Orchestrate(Orchestrate::Catalogue(e)) => catalogue_exit_code(e),
            Self::Orchestrate(_) | Self::Io(_) => exit_code::GENERAL,
            Self::MissingOption { .. } => exit_code::SELECTION,
        }
    }

    /// Print the error to stderr, listing every requirement violation
    pub fn report(&self) {
        match self {
            Self::Core(s4_core::Error::Requirements(violations)) => {
                eprintln!(
                    "{}: {} requirement violation(s)",
                    "error".red().bold(),
                    violations.len()
                );
                for violation in violations {
                    eprintln!("  {} {}", "-".red(), violation);
                }
            }
            _ => eprintln!("{}: {}", "error".red().bold(), self),
        }
    }
}

fn catalogue_exit_code(e: &s4_catalogue::Error) -> i32 {
    match e {
        s4_catalogue::Error::Load(_) => exit_code::LOAD,
        _ => exit_code::GENERAL,
    }
}
