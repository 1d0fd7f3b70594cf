//! The merged, immutable catalogue

use std::collections::HashMap;

use crate::lint::CatalogueWarning;
use crate::model::{Architecture, Defaults, Flag, Platform, Project};
use crate::value::FlagType;

/// Flags assigned from the selection itself rather than from an overlay
///
/// They hold entity names, so they are string flags even when no document
/// declares them.
pub const DERIVED_FLAGS: &[&str] = &[
    "architecture",
    "architecture-family",
    "kernel-platform",
    "platform",
];

/// Every entity known after all documents were merged
///
/// Entities are kept in declaration order: an entity replaced by a later
/// document keeps the position of its first declaration.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    defaults: Defaults,
    flags: Vec<Flag>,
    flag_index: HashMap<String, usize>,
    architectures: Vec<Architecture>,
    platforms: Vec<Platform>,
    projects: Vec<Project>,
    warnings: Vec<CatalogueWarning>,
}

impl Catalogue {
    pub(crate) fn new(
        defaults: Defaults,
        flags: Vec<Flag>,
        architectures: Vec<Architecture>,
        platforms: Vec<Platform>,
        projects: Vec<Project>,
    ) -> Self {
        let flag_index = flags
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self {
            defaults,
            flags,
            flag_index,
            architectures,
            platforms,
            projects,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn with_warnings(mut self, warnings: Vec<CatalogueWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Declared flags in declaration order
    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn flag(&self, name: &str) -> Option<&Flag> {
        self.flag_index.get(name).map(|&i| &self.flags[i])
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.flag_index.contains_key(name)
    }

    /// Type of a flag; undeclared flags are implicitly boolean
    pub fn flag_type(&self, name: &str) -> FlagType {
        match self.flag(name) {
            Some(flag) => flag.flag_type,
            None if DERIVED_FLAGS.contains(&name) => FlagType::String,
            None => FlagType::Boolean,
        }
    }

    /// Position of a declared flag in declaration order
    pub fn declaration_index(&self, name: &str) -> Option<usize> {
        self.flag_index.get(name).copied()
    }

    pub fn architectures(&self) -> &[Architecture] {
        &self.architectures
    }

    /// Look up an architecture by name or alias
    pub fn architecture(&self, name: &str) -> Option<&Architecture> {
        self.architectures
            .iter()
            .find(|a| a.name == name)
            .or_else(|| self.architectures.iter().find(|a| a.answers_to(name)))
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn platform(&self, name: &str) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.name == name)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Data-quality warnings gathered while loading
    pub fn warnings(&self) -> &[CatalogueWarning] {
        &self.warnings
    }
}
