//! `resolve → validate → emit` in one call

use std::path::PathBuf;

use serde::Serialize;

use s4_catalogue::{Catalogue, Project, Repository};

use crate::compositor::{ResolveWarning, resolve};
use crate::emitter::{BuildVariables, EmitPolicy};
use crate::error::{Error, Result, SelectionError};
use crate::selection::Selection;
use crate::table::FlagTable;
use crate::validator::validate;

/// Project details the orchestration layer needs after resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_server: Option<String>,
    pub exit_phrase: String,
}

impl ProjectDescriptor {
    pub fn new(project: &Project, catalogue: &Catalogue) -> Self {
        Self {
            name: project.name.clone(),
            repository: project.repository.clone(),
            source_directory: project.source_directory.clone(),
            root_server: project.root_server.clone(),
            exit_phrase: project.exit_phrase(catalogue.defaults()).to_string(),
        }
    }
}

/// A validated flag table together with what it emits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfiguration {
    pub selection: Selection,
    pub project: ProjectDescriptor,
    pub table: FlagTable,
    pub variables: BuildVariables,
    pub warnings: Vec<ResolveWarning>,
}

impl ResolvedConfiguration {
    /// Fingerprint of the emitted variables
    pub fn fingerprint(&self) -> String {
        self.variables.fingerprint()
    }
}

/// Resolve, validate and emit one selection
///
/// Nothing is emitted when any requirement is violated; every violation
/// is returned in [`Error::Requirements`].
pub fn configure(
    catalogue: &Catalogue,
    selection: &Selection,
    policy: EmitPolicy,
) -> Result<ResolvedConfiguration> {
    let resolution = resolve(catalogue, selection)?;

    let violations = validate(&resolution.table, catalogue);
    if !violations.is_empty() {
        return Err(Error::Requirements(violations));
    }

    // `resolve` has already checked that the project exists
    let project = catalogue
        .project(&selection.project)
        .map(|p| ProjectDescriptor::new(p, catalogue))
        .ok_or_else(|| SelectionError::UnknownProject {
            project: selection.project.clone(),
        })?;

    let variables = BuildVariables::emit(&resolution.table, catalogue, policy);
    tracing::debug!(
        project = %project.name,
        fingerprint = %variables.fingerprint(),
        "Configuration resolved"
    );

    Ok(ResolvedConfiguration {
        selection: selection.clone(),
        project,
        table: resolution.table,
        variables,
        warnings: resolution.warnings,
    })
}
