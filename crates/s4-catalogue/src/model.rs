//! Catalogue entity model
//!
//! Entities are plain values. Precedence between them is not modelled here;
//! each entity only carries the [`Overlay`] it contributes to a resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::value::{FlagType, RequirementSet, Value};

/// Kind of named catalogue entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Flag,
    Architecture,
    Platform,
    Variation,
    Project,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => write!(f, "flag"),
            Self::Architecture => write!(f, "architecture"),
            Self::Platform => write!(f, "platform"),
            Self::Variation => write!(f, "variation"),
            Self::Project => write!(f, "project"),
        }
    }
}

/// Named entity that can be replaced as a whole by a later document
pub trait Entity {
    const KIND: EntityKind;

    fn name(&self) -> &str;
}

/// Flag assignments contributed by one precedence layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Overlay(BTreeMap<String, Value>);

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, flag: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(flag.into(), value.into());
    }

    /// Builder form of [`Overlay::insert`]
    pub fn with(mut self, flag: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(flag, value);
        self
    }

    pub fn get(&self, flag: &str) -> Option<&Value> {
        self.0.get(flag)
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.0.contains_key(flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Overlay {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Definition of a configurable flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Flag {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    /// Build-system variable this flag is emitted as
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    /// Disjunction of requirement sets gating a non-default value
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequirementSet>,
}

impl Flag {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            flag_type: FlagType::Boolean,
            variable: None,
            requires: Vec::new(),
        }
    }

    /// A boolean flag with no constraints, used for references to undeclared flags
    pub fn implicit(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    pub fn with_type(mut self, flag_type: FlagType) -> Self {
        self.flag_type = flag_type;
        self
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn with_requirement(mut self, set: RequirementSet) -> Self {
        self.requires.push(set);
        self
    }

    pub fn implicit_default(&self) -> Value {
        self.flag_type.implicit_default()
    }
}

impl Entity for Flag {
    const KIND: EntityKind = EntityKind::Flag;

    fn name(&self) -> &str {
        &self.name
    }
}

/// CPU/ISA target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Architecture {
    pub name: String,
    /// Instruction set family, e.g. `arm` for `aarch64`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub overlay: Overlay,
}

impl Architecture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: None,
            aliases: Vec::new(),
            overlay: Overlay::new(),
        }
    }

    /// Whether `name` is this architecture's name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

impl Entity for Architecture {
    const KIND: EntityKind = EntityKind::Architecture;

    fn name(&self) -> &str {
        &self.name
    }
}

/// Named refinement of a platform, e.g. one board of a family
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variation {
    pub name: String,
    /// Parent platform as redeclared by the variation itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Architecture this variation is pinned to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    /// Replacement for the parent's supported architecture set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architectures: Option<Vec<String>>,
    pub overlay: Overlay,
}

impl Variation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform: None,
            architecture: None,
            architectures: None,
            overlay: Overlay::new(),
        }
    }
}

/// Hardware target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Platform {
    pub name: String,
    /// Names of supported architectures, never empty once loaded
    pub architectures: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variations: Vec<Variation>,
    pub overlay: Overlay,
}

impl Platform {
    pub fn new(name: impl Into<String>, architectures: &[&str]) -> Self {
        Self {
            name: name.into(),
            architectures: architectures.iter().map(|a| a.to_string()).collect(),
            variations: Vec::new(),
            overlay: Overlay::new(),
        }
    }

    pub fn variation(&self, name: &str) -> Option<&Variation> {
        self.variations.iter().find(|v| v.name == name)
    }

    /// Architectures supported when `variation` is selected
    pub fn supported_architectures<'a>(&'a self, variation: Option<&'a Variation>) -> &'a [String] {
        variation
            .and_then(|v| v.architectures.as_deref())
            .unwrap_or(self.architectures.as_slice())
    }
}

impl Entity for Platform {
    const KIND: EntityKind = EntityKind::Platform;

    fn name(&self) -> &str {
        &self.name
    }
}

/// Buildable target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Project {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
    /// Path to the build-system source directory within the workspace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<PathBuf>,
    /// Name of the root executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_server: Option<String>,
    /// Phrase printed once the root executable has completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_phrase: Option<String>,
    /// Flags a user may set directly for this project
    pub command_line: Vec<String>,
    pub overlay: Overlay,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repository: None,
            source_directory: None,
            root_server: None,
            exit_phrase: None,
            command_line: Vec::new(),
            overlay: Overlay::new(),
        }
    }

    pub fn is_eligible(&self, flag: &str) -> bool {
        self.command_line.iter().any(|f| f == flag)
    }

    /// Completion marker, falling back to the catalogue-wide default
    pub fn exit_phrase<'a>(&'a self, defaults: &'a Defaults) -> &'a str {
        self.exit_phrase
            .as_deref()
            .unwrap_or_else(|| defaults.exit_phrase())
    }
}

impl Entity for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn name(&self) -> &str {
        &self.name
    }
}

/// Source repository of a project, `organisation/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    pub organisation: String,
    pub name: String,
}

impl FromStr for Repository {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split('/').collect::<Vec<_>>().as_slice() {
            [organisation, name]
                if !organisation.is_empty() && !name.is_empty() && !name.ends_with(".git") =>
            {
                Ok(Self {
                    organisation: organisation.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(format!("malformed repository '{}', expected 'organisation/name'", s)),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organisation, self.name)
    }
}

impl Serialize for Repository {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Catalogue-wide defaults
///
/// Unlike entities, defaults merge field by field: a later document only
/// replaces the fields it sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Defaults {
    pub git_server: Option<String>,
    pub docker_image: Option<String>,
    pub repo_url: Option<String>,
    pub repo_branch: Option<String>,
    pub repo_manifest: Option<String>,
    pub exit_phrase: Option<String>,
}

impl Defaults {
    pub const GIT_SERVER: &'static str = "https://github.com";
    pub const DOCKER_IMAGE: &'static str = "docker.io/trustworthysystems/camkes-riscv";
    pub const REPO_URL: &'static str = "https://storage.googleapis.com/git-repo-downloads/repo";
    pub const EXIT_PHRASE: &'static str = "All is well in the universe";

    /// Keys recognised at the top level of a document
    pub const KEYS: &'static [&'static str] = &[
        "git-server",
        "docker-image",
        "repo-url",
        "repo-branch",
        "repo-manifest",
        "exit-phrase",
    ];

    pub fn merge(&mut self, other: Defaults) {
        fn take(slot: &mut Option<String>, other: Option<String>) {
            if other.is_some() {
                *slot = other;
            }
        }
        take(&mut self.git_server, other.git_server);
        take(&mut self.docker_image, other.docker_image);
        take(&mut self.repo_url, other.repo_url);
        take(&mut self.repo_branch, other.repo_branch);
        take(&mut self.repo_manifest, other.repo_manifest);
        take(&mut self.exit_phrase, other.exit_phrase);
    }

    pub fn git_server(&self) -> &str {
        self.git_server.as_deref().unwrap_or(Self::GIT_SERVER)
    }

    /// Manifest URL for a project repository on the git server
    pub fn git_repo_url(&self, repository: &Repository) -> String {
        format!("{}/{}.git", self.git_server().trim_end_matches('/'), repository)
    }

    pub fn docker_image(&self) -> &str {
        self.docker_image.as_deref().unwrap_or(Self::DOCKER_IMAGE)
    }

    pub fn repo_url(&self) -> &str {
        self.repo_url.as_deref().unwrap_or(Self::REPO_URL)
    }

    pub fn repo_branch(&self) -> Option<&str> {
        self.repo_branch.as_deref()
    }

    pub fn repo_manifest(&self) -> Option<&str> {
        self.repo_manifest.as_deref()
    }

    pub fn exit_phrase(&self) -> &str {
        self.exit_phrase.as_deref().unwrap_or(Self::EXIT_PHRASE)
    }
}
