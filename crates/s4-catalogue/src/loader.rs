//! Catalogue loading: source discovery, ordered merge and validation
//!
//! Documents are merged in order. A later document that declares an entity
//! under an existing name replaces that entity as a whole; top-level
//! defaults merge field by field.
//!
//! ## Source order
//!
//! 1. `easy-settings.cmake` of the workspace, when requested
//! 2. Built-in catalogue
//! 3. User overlays in the home and config directories
//! 4. Workspace overlay
//! 5. Explicit overlay files

use std::path::{Path, PathBuf};

use crate::builtin;
use crate::catalogue::{Catalogue, DERIVED_FLAGS};
use crate::document::{Document, DocumentFormat};
use crate::easy_settings;
use crate::error::{LoadError, Result};
use crate::lint::{self, CatalogueWarning};
use crate::model::{Architecture, Defaults, Entity, Flag, Overlay, Platform, Project};
use crate::value::{FlagType, Requirement, Value};

/// File names recognised as user catalogue overlays
pub const OVERLAY_FILE_NAMES: &[&str] = &[
    "s4.toml",
    ".s4.toml",
    ".s4",
    "s4.yaml",
    "s4.yml",
    ".s4.yaml",
    ".s4.yml",
];

/// Where a catalogue document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueSource {
    /// The catalogue compiled into the binary
    Builtin,
    /// A document on disk; its format follows the file extension
    File(PathBuf),
    /// Flag definitions scanned from an `easy-settings.cmake`
    EasySettings(PathBuf),
    /// In-memory content
    Inline {
        label: String,
        content: String,
        format: DocumentFormat,
    },
}

impl CatalogueSource {
    pub fn read(&self) -> Result<Document> {
        match self {
            Self::Builtin => Ok(builtin::document()?),
            Self::File(path) => Document::read(path),
            Self::EasySettings(path) => easy_settings::read_document(path),
            Self::Inline {
                label,
                content,
                format,
            } => Ok(Document::parse(label.clone(), content, *format)?),
        }
    }
}

impl std::fmt::Display for CatalogueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin => write!(f, "{}", builtin::LABEL),
            Self::File(path) | Self::EasySettings(path) => write!(f, "{}", path.display()),
            Self::Inline { label, .. } => write!(f, "{}", label),
        }
    }
}

/// Ordered list of catalogue sources
#[derive(Debug, Clone, Default)]
pub struct CatalogueLoader {
    sources: Vec<CatalogueSource>,
}

impl CatalogueLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin(mut self) -> Self {
        self.sources.push(CatalogueSource::Builtin);
        self
    }

    pub fn source(mut self, source: CatalogueSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.source(CatalogueSource::File(path.into()))
    }

    pub fn inline(self, label: impl Into<String>, content: impl Into<String>) -> Self {
        self.source(CatalogueSource::Inline {
            label: label.into(),
            content: content.into(),
            format: DocumentFormat::Toml,
        })
    }

    /// Add the workspace's `easy-settings.cmake` as the lowest-precedence source
    pub fn easy_settings(mut self, workspace: &Path) -> Self {
        if let Some(path) = easy_settings::discover(workspace) {
            self.sources.insert(0, CatalogueSource::EasySettings(path));
        }
        self
    }

    /// Add overlays found in the user's home and config directories
    pub fn user_overlays(self) -> Self {
        let dirs = [dirs::home_dir(), dirs::config_dir().map(|d| d.join("s4"))];
        dirs.into_iter()
            .flatten()
            .fold(self, |loader, dir| loader.overlays_in(&dir))
    }

    /// Add overlays found directly in `dir`
    pub fn overlays_in(mut self, dir: &Path) -> Self {
        for name in OVERLAY_FILE_NAMES {
            let path = dir.join(name);
            if path.is_file() && !self.contains_file(&path) {
                tracing::debug!(?path, "Found catalogue overlay");
                self.sources.push(CatalogueSource::File(path));
            }
        }
        self
    }

    fn contains_file(&self, path: &Path) -> bool {
        self.sources
            .iter()
            .any(|s| matches!(s, CatalogueSource::File(p) if p == path))
    }

    pub fn sources(&self) -> &[CatalogueSource] {
        &self.sources
    }

    /// Read every source and merge the documents
    pub fn load(&self) -> Result<Catalogue> {
        let documents = self
            .sources
            .iter()
            .map(|source| {
                tracing::debug!(%source, "Loading catalogue source");
                source.read()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(load(documents)?)
    }
}

/// Merge documents in order into a validated catalogue
pub fn load(documents: Vec<Document>) -> std::result::Result<Catalogue, LoadError> {
    let mut merged = Merged::default();
    for document in documents {
        merged.absorb(document);
    }
    merged.validate()?;

    let warnings = merged.warnings;
    let catalogue = Catalogue::new(
        merged.defaults,
        strip(merged.flags),
        strip(merged.architectures),
        strip(merged.platforms),
        strip(merged.projects),
    );

    let mut all = warnings;
    all.extend(lint::lint(&catalogue));
    for warning in &all {
        tracing::warn!(entity = ?warning.entity, "{}", warning.message);
    }
    Ok(catalogue.with_warnings(all))
}

/// An entity with the label of the document that declared it
type Declared<T> = (T, String);

fn strip<T>(declared: Vec<Declared<T>>) -> Vec<T> {
    declared.into_iter().map(|(entity, _)| entity).collect()
}

#[derive(Default)]
struct Merged {
    defaults: Defaults,
    flags: Vec<Declared<Flag>>,
    architectures: Vec<Declared<Architecture>>,
    platforms: Vec<Declared<Platform>>,
    projects: Vec<Declared<Project>>,
    warnings: Vec<CatalogueWarning>,
}

impl Merged {
    fn absorb(&mut self, document: Document) {
        let Document {
            label,
            defaults,
            flags,
            architectures,
            platforms,
            projects,
            warnings,
        } = document;

        self.defaults.merge(defaults);
        self.warnings.extend(warnings);

        for flag in flags {
            if let Some((previous, _)) = self.flags.iter().find(|(f, _)| f.name == flag.name)
                && previous.variable.is_some()
                && previous.variable != flag.variable
            {
                self.warnings.push(CatalogueWarning::warning(
                    Some(&flag.name),
                    format!(
                        "Flag '{}' is redeclared in {} with variable {} instead of {}",
                        flag.name,
                        label,
                        flag.variable.as_deref().unwrap_or("<none>"),
                        previous.variable.as_deref().unwrap_or("<none>"),
                    ),
                ));
            }
            replace_or_push(&mut self.flags, flag, &label);
        }
        for architecture in architectures {
            replace_or_push(&mut self.architectures, architecture, &label);
        }
        for platform in platforms {
            replace_or_push(&mut self.platforms, platform, &label);
        }
        for project in projects {
            replace_or_push(&mut self.projects, project, &label);
        }
    }

    fn flag(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|(f, _)| f.name == name).map(|(f, _)| f)
    }

    fn knows_architecture(&self, name: &str) -> bool {
        self.architectures.iter().any(|(a, _)| a.answers_to(name))
    }

    fn validate(&self) -> std::result::Result<(), LoadError> {
        self.validate_architecture_names()?;

        for (flag, label) in &self.flags {
            for set in &flag.requires {
                for (referenced, requirement) in set {
                    let context = format!("requirement of flag '{}'", flag.name);
                    self.check_requirement(referenced, requirement, &context, label)?;
                }
            }
        }

        for (architecture, label) in &self.architectures {
            let context = format!("architecture '{}'", architecture.name);
            self.check_overlay(&architecture.overlay, &context, label)?;
        }

        for (platform, label) in &self.platforms {
            let context = format!("platform '{}'", platform.name);
            self.check_overlay(&platform.overlay, &context, label)?;
            self.check_architectures(&platform.architectures, &context, label)?;

            for variation in &platform.variations {
                let context = format!(
                    "variation '{}' of platform '{}'",
                    variation.name, platform.name
                );
                self.check_overlay(&variation.overlay, &context, label)?;
                if let Some(architectures) = &variation.architectures {
                    self.check_architectures(architectures, &context, label)?;
                }
                if let Some(architecture) = &variation.architecture {
                    self.check_architectures(std::slice::from_ref(architecture), &context, label)?;
                }
            }
        }

        for (project, label) in &self.projects {
            let context = format!("project '{}'", project.name);
            self.check_overlay(&project.overlay, &context, label)?;
            for name in &project.command_line {
                if self.flag(name).is_none() {
                    return Err(LoadError::dangling(
                        label,
                        format!("{} lists undeclared flag '{}' on its command line", context, name),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Architecture names and aliases must identify exactly one architecture
    fn validate_architecture_names(&self) -> std::result::Result<(), LoadError> {
        for (i, (architecture, label)) in self.architectures.iter().enumerate() {
            for alias in &architecture.aliases {
                let clash = self
                    .architectures
                    .iter()
                    .enumerate()
                    .find(|(j, (other, _))| *j != i && other.answers_to(alias));
                if let Some((_, (other, _))) = clash {
                    return Err(LoadError::duplicate(
                        label,
                        format!(
                            "alias '{}' of architecture '{}' is also claimed by '{}'",
                            alias, architecture.name, other.name
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_architectures(
        &self,
        architectures: &[String],
        context: &str,
        label: &str,
    ) -> std::result::Result<(), LoadError> {
        match architectures.iter().find(|a| !self.knows_architecture(a)) {
            Some(unknown) => Err(LoadError::dangling(
                label,
                format!("{} references undeclared architecture '{}'", context, unknown),
            )),
            None => Ok(()),
        }
    }

    fn check_overlay(
        &self,
        overlay: &Overlay,
        context: &str,
        label: &str,
    ) -> std::result::Result<(), LoadError> {
        overlay
            .iter()
            .try_for_each(|(flag, value)| self.check_value(flag, value, context, label))
    }

    fn check_requirement(
        &self,
        flag: &str,
        requirement: &Requirement,
        context: &str,
        label: &str,
    ) -> std::result::Result<(), LoadError> {
        requirement
            .values()
            .try_for_each(|value| self.check_value(flag, value, context, label))
    }

    /// A value must match its flag's declared type; undeclared flags only take booleans
    fn check_value(
        &self,
        flag: &str,
        value: &Value,
        context: &str,
        label: &str,
    ) -> std::result::Result<(), LoadError> {
        let declared = match self.flag(flag) {
            Some(declared) => declared.flag_type,
            None if DERIVED_FLAGS.contains(&flag) => FlagType::String,
            None if value.is_bool() => return Ok(()),
            None => {
                return Err(LoadError::dangling(
                    label,
                    format!(
                        "{} assigns {} to undeclared flag '{}'; non-boolean flags must be declared",
                        context, value, flag
                    ),
                ));
            }
        };
        if value.flag_type() != declared {
            return Err(LoadError::schema(
                label,
                format!(
                    "{} assigns {} to {} flag '{}'",
                    context, value, declared, flag
                ),
            ));
        }
        Ok(())
    }
}

/// Replace a same-named entity in place, or append a new one
fn replace_or_push<T: Entity>(entities: &mut Vec<Declared<T>>, entity: T, label: &str) {
    match entities.iter_mut().find(|(e, _)| e.name() == entity.name()) {
        Some(slot) => {
            tracing::debug!(
                kind = %T::KIND,
                name = entity.name(),
                previous = %slot.1,
                document = label,
                "Replacing catalogue entity"
            );
            *slot = (entity, label.to_string());
        }
        None => entities.push((entity, label.to_string())),
    }
}
