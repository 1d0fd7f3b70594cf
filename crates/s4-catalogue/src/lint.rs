//! Catalogue data-quality checks
//!
//! Nothing here rejects a catalogue. Problems that make a catalogue unusable
//! are [`LoadError`](crate::LoadError)s; these warnings flag data that loads
//! fine but is probably not what the author meant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalogue::Catalogue;

/// Severity level for catalogue warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarnLevel {
    /// Informational notice
    Info,
    /// Potential problem
    Warning,
}

impl std::fmt::Display for WarnLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A warning about catalogue contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueWarning {
    pub level: WarnLevel,
    /// Entity this relates to, if applicable
    pub entity: Option<String>,
    pub message: String,
}

impl CatalogueWarning {
    pub fn warning(entity: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            entity: entity.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn info(entity: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Info,
            entity: entity.map(str::to_string),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CatalogueWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

/// Check a merged catalogue for suspicious flag and project data
pub fn lint(catalogue: &Catalogue) -> Vec<CatalogueWarning> {
    let mut warnings = Vec::new();

    // Variables mapped by more than one flag
    let mut by_variable: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for flag in catalogue.flags() {
        if let Some(variable) = flag.variable.as_deref() {
            by_variable.entry(variable).or_default().push(&flag.name);
        }
    }
    for (variable, flags) in &by_variable {
        if flags.len() > 1 {
            warnings.push(CatalogueWarning::warning(
                Some(flags[0]),
                format!(
                    "Variable '{}' is mapped by several flags: {}",
                    variable,
                    flags.join(", ")
                ),
            ));
        }
    }

    // Variables that only differ in case are likely misspellings
    let mut by_folded: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for variable in by_variable.keys() {
        by_folded.entry(variable.to_lowercase()).or_default().push(variable);
    }
    for spellings in by_folded.values().filter(|s| s.len() > 1) {
        let owners: Vec<&str> = spellings
            .iter()
            .flat_map(|v| by_variable[v].iter().copied())
            .collect();
        warnings.push(CatalogueWarning::warning(
            owners.first().copied(),
            format!(
                "Variables {} differ only in case (flags: {})",
                spellings
                    .iter()
                    .map(|s| format!("'{}'", s))
                    .collect::<Vec<_>>()
                    .join(" and "),
                owners.join(", ")
            ),
        ));
    }

    for project in catalogue.projects() {
        if project.command_line.is_empty() {
            warnings.push(CatalogueWarning::info(
                Some(&project.name),
                format!("Project '{}' exposes no command-line flags", project.name),
            ));
        }
        for name in &project.command_line {
            let mapped = catalogue
                .flag(name)
                .is_some_and(|flag| flag.variable.is_some());
            if !mapped {
                warnings.push(CatalogueWarning::warning(
                    Some(&project.name),
                    format!(
                        "Project '{}' exposes '{}' on the command line but it maps to no build variable",
                        project.name, name
                    ),
                ));
            }
        }
    }

    warnings
}
