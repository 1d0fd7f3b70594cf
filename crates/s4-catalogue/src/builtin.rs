//! The catalogue compiled into s4

use crate::document::Document;
use crate::error::LoadError;

/// Document label used in diagnostics
pub const LABEL: &str = "<builtin>";

const BUILTIN_TOML: &str = include_str!("../catalogue/builtin.toml");

/// Parse the built-in catalogue document
pub fn document() -> Result<Document, LoadError> {
    Document::from_toml_str(LABEL, BUILTIN_TOML)
}
