//! Error types for s4-core

use s4_catalogue::FlagType;

use crate::validator::Violation;

/// Result type for s4-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// A selection that cannot be honoured against the catalogue
///
/// Raised before any flag table is built, or while applying the
/// command-line layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Unknown project '{project}'")]
    UnknownProject { project: String },

    #[error("Unknown platform '{platform}'")]
    UnknownPlatform { platform: String },

    #[error("Platform '{platform}' has no variation '{variation}'")]
    UnknownVariation { platform: String, variation: String },

    #[error("Unknown architecture '{architecture}'")]
    UnknownArchitecture { architecture: String },

    #[error(
        "Platform '{platform}' does not support architecture '{architecture}' (supported: {})",
        supported.join(", ")
    )]
    UnsupportedArchitectureForPlatform {
        architecture: String,
        platform: String,
        supported: Vec<String>,
    },

    #[error("Variation '{variation}' belongs to platform '{declared}', not '{selected}'")]
    VariationPlatformMismatch {
        variation: String,
        declared: String,
        selected: String,
    },

    #[error("Variation '{variation}' requires architecture '{required}', not '{selected}'")]
    VariationArchitectureMismatch {
        variation: String,
        required: String,
        selected: String,
    },

    #[error("Flag '{flag}' cannot be set on the command line for project '{project}'")]
    IneligibleCommandLineFlag { flag: String, project: String },

    #[error("Unknown flag '{flag}'")]
    UnknownFlag { flag: String },

    #[error("Invalid value '{value}' for {expected} flag '{flag}'")]
    InvalidCommandLineValue {
        flag: String,
        value: String,
        expected: FlagType,
    },

    #[error("Flag '{flag}' is a {flag_type} flag and cannot be {operation}d")]
    CommandLineTypeMismatch {
        flag: String,
        flag_type: FlagType,
        /// `enable` or `disable`
        operation: &'static str,
    },

    #[error("Malformed {what} '{input}': {reason}")]
    Malformed {
        what: &'static str,
        input: String,
        reason: &'static str,
    },
}

/// An output format name that is not one of the renderings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown format '{format}' (expected cmake, cache or json)")]
pub struct UnknownRendering {
    pub format: String,
}

/// Errors that can occur while resolving a configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Every requirement violation found in one resolution
    #[error("{} requirement violation(s): {}", .0.len(), summary(.0))]
    Requirements(Vec<Violation>),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn summary(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.flag.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
