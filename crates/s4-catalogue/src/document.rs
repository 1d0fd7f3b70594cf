//! Parsing of a single catalogue document
//!
//! A document is parsed into a generic table first and then walked section by
//! section. Every entity section is accepted in two shapes:
//!
//! ```toml
//! [platform.tx2]               # nested-table shape
//! architectures = ["aarch64"]
//!
//! [[platform]]                 # array-of-tables shape
//! name = "odroidc2"
//! architectures = ["aarch64"]
//! ```
//!
//! Keys that are not reserved by an entity are flag assignments for that
//! entity's overlay. Unknown top-level keys and unknown flag-definition keys
//! are tolerated.

use std::path::Path;

use crate::error::{Error, LoadError, Result};
use crate::lint::CatalogueWarning;
use crate::model::{Architecture, Defaults, EntityKind, Flag, Overlay, Platform, Project, Variation};
use crate::value::{FlagType, Requirement, RequirementSet, Value};

/// Serialization format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Yaml,
}

impl DocumentFormat {
    /// Detect the format from a file extension, defaulting to TOML
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Toml,
        }
    }
}

/// One parsed catalogue source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Where the document came from, used in diagnostics
    pub label: String,
    pub defaults: Defaults,
    pub flags: Vec<Flag>,
    pub architectures: Vec<Architecture>,
    pub platforms: Vec<Platform>,
    pub projects: Vec<Project>,
    /// Data-quality issues that did not prevent parsing
    pub warnings: Vec<CatalogueWarning>,
}

const SECTIONS: &[&str] = &["flag", "architecture", "arch", "platform", "project"];
const FLAG_KEYS: &[&str] = &["name", "description", "type", "variable", "requires", "require"];
const ARCHITECTURE_KEYS: &[&str] = &["name", "family", "aliases"];
const PLATFORM_KEYS: &[&str] = &["name", "architectures", "variation", "variant"];
const VARIATION_KEYS: &[&str] = &["name", "platform", "architecture", "architectures"];
const PROJECT_KEYS: &[&str] = &[
    "name",
    "repository",
    "source-directory",
    "source-dir",
    "root-server",
    "rootserver",
    "exit-phrase",
    "command-line",
    "cmdline",
];

impl Document {
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Parse document content in the given format
    pub fn parse(
        label: impl Into<String>,
        content: &str,
        format: DocumentFormat,
    ) -> std::result::Result<Self, LoadError> {
        match format {
            DocumentFormat::Toml => Self::from_toml_str(label, content),
            DocumentFormat::Yaml => Self::from_yaml_str(label, content),
        }
    }

    pub fn from_toml_str(
        label: impl Into<String>,
        content: &str,
    ) -> std::result::Result<Self, LoadError> {
        let label = label.into();
        let table: toml::Table =
            toml::from_str(content).map_err(|e| LoadError::schema(&label, e.to_string()))?;
        Self::from_table(label, &table)
    }

    pub fn from_yaml_str(
        label: impl Into<String>,
        content: &str,
    ) -> std::result::Result<Self, LoadError> {
        let label = label.into();
        let value: toml::Value =
            serde_yaml::from_str(content).map_err(|e| LoadError::schema(&label, e.to_string()))?;
        match value {
            toml::Value::Table(table) => Self::from_table(label, &table),
            _ => Err(LoadError::schema(&label, "document root must be a mapping")),
        }
    }

    /// Read and parse a document from disk, detecting its format
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::DocumentNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        tracing::debug!(?path, "Parsing catalogue document");
        Ok(Self::parse(
            path.display().to_string(),
            &content,
            DocumentFormat::from_path(path),
        )?)
    }

    /// Walk a parsed table into entities
    pub fn from_table(
        label: impl Into<String>,
        table: &toml::Table,
    ) -> std::result::Result<Self, LoadError> {
        let mut parser = Parser {
            label: label.into(),
            warnings: Vec::new(),
        };

        let defaults = parser.defaults(table)?;

        let mut flags = Vec::new();
        for (name, entry) in parser.section(table, &["flag"], EntityKind::Flag)? {
            flags.push(parser.flag(name, entry)?);
        }

        let mut architectures = Vec::new();
        for (name, entry) in
            parser.section(table, &["architecture", "arch"], EntityKind::Architecture)?
        {
            architectures.push(parser.architecture(name, entry)?);
        }

        let mut platforms = Vec::new();
        for (name, entry) in parser.section(table, &["platform"], EntityKind::Platform)? {
            platforms.push(parser.platform(name, entry)?);
        }

        let mut projects = Vec::new();
        for (name, entry) in parser.section(table, &["project"], EntityKind::Project)? {
            projects.push(parser.project(name, entry)?);
        }

        for key in table.keys() {
            if !SECTIONS.contains(&key.as_str()) && !Defaults::KEYS.contains(&key.as_str()) {
                tracing::debug!(document = %parser.label, key, "Ignoring unknown top-level key");
            }
        }

        Ok(Self {
            label: parser.label,
            defaults,
            flags,
            architectures,
            platforms,
            projects,
            warnings: parser.warnings,
        })
    }
}

struct Parser {
    label: String,
    warnings: Vec<CatalogueWarning>,
}

impl Parser {
    fn schema(&self, detail: impl Into<String>) -> LoadError {
        LoadError::schema(&self.label, detail)
    }

    fn defaults(&self, table: &toml::Table) -> std::result::Result<Defaults, LoadError> {
        Ok(Defaults {
            git_server: self.opt_string(table, "git-server", "document")?,
            docker_image: self.opt_string(table, "docker-image", "document")?,
            repo_url: self.opt_string(table, "repo-url", "document")?,
            repo_branch: self.opt_string(table, "repo-branch", "document")?,
            repo_manifest: self.opt_string(table, "repo-manifest", "document")?,
            exit_phrase: self.opt_string(table, "exit-phrase", "document")?,
        })
    }

    /// Collect the named entries of an entity section in declaration order
    ///
    /// Identical repeated entries are dropped with a warning; repeated entries
    /// that disagree are a [`DuplicateName`](crate::LoadErrorKind::DuplicateName) error.
    fn section<'t>(
        &mut self,
        table: &'t toml::Table,
        keys: &[&str],
        kind: EntityKind,
    ) -> std::result::Result<Vec<(&'t str, &'t toml::Table)>, LoadError> {
        let mut entries = Vec::new();
        for key in keys {
            if let Some(section) = table.get(*key) {
                entries.extend(self.entries(section, kind, &kind.to_string())?);
            }
        }
        self.dedup(entries, &kind.to_string())
    }

    fn entries<'t>(
        &self,
        section: &'t toml::Value,
        kind: EntityKind,
        context: &str,
    ) -> std::result::Result<Vec<(&'t str, &'t toml::Table)>, LoadError> {
        match section {
            toml::Value::Table(named) => named
                .iter()
                .map(|(name, entry)| match entry {
                    toml::Value::Table(entry) => Ok((name.as_str(), entry)),
                    _ => Err(self.schema(format!("{} `{}` must be a table", context, name))),
                })
                .collect(),
            toml::Value::Array(listed) => listed
                .iter()
                .map(|entry| {
                    let entry = entry
                        .as_table()
                        .ok_or_else(|| self.schema(format!("{} entries must be tables", context)))?;
                    match entry.get("name") {
                        Some(toml::Value::String(name)) => Ok((name.as_str(), entry)),
                        Some(_) => Err(self.schema(format!("{} `name` must be a string", context))),
                        None => Err(self.schema(format!("{} entry without a `name`", kind))),
                    }
                })
                .collect(),
            _ => Err(self.schema(format!(
                "{} section must be a table or an array of tables",
                context
            ))),
        }
    }

    fn dedup<'t>(
        &mut self,
        entries: Vec<(&'t str, &'t toml::Table)>,
        context: &str,
    ) -> std::result::Result<Vec<(&'t str, &'t toml::Table)>, LoadError> {
        let mut unique: Vec<(&'t str, &'t toml::Table)> = Vec::new();
        for (name, entry) in entries {
            match unique.iter().find(|(seen, _)| *seen == name) {
                None => unique.push((name, entry)),
                Some((_, first)) if without_name(first) == without_name(entry) => {
                    self.warnings.push(CatalogueWarning::warning(
                        Some(name),
                        format!(
                            "{} `{}` is declared twice in {} with identical values",
                            context, name, self.label
                        ),
                    ));
                }
                Some(_) => {
                    return Err(LoadError::duplicate(
                        &self.label,
                        format!("{} `{}` is declared twice with different values", context, name),
                    ));
                }
            }
        }
        Ok(unique)
    }

    fn flag(&self, name: &str, table: &toml::Table) -> std::result::Result<Flag, LoadError> {
        let what = format!("flag `{}`", name);

        let flag_type = match self.opt_string(table, "type", &what)? {
            None => FlagType::Boolean,
            Some(ty) => FlagType::parse(&ty)
                .ok_or_else(|| self.schema(format!("{}: unknown type `{}`", what, ty)))?,
        };

        let requires = match table.get("requires").or_else(|| table.get("require")) {
            None => Vec::new(),
            Some(toml::Value::Array(sets)) => sets
                .iter()
                .map(|set| match set {
                    toml::Value::Table(set) => self.requirement_set(set, &what),
                    _ => Err(self.schema(format!("{}: each requirement set must be a table", what))),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?,
            Some(toml::Value::Table(set)) => vec![self.requirement_set(set, &what)?],
            Some(_) => {
                return Err(self.schema(format!(
                    "{}: `requires` must be an array of tables",
                    what
                )));
            }
        };

        for key in table.keys() {
            if !FLAG_KEYS.contains(&key.as_str()) {
                tracing::debug!(document = %self.label, flag = name, key, "Ignoring unknown flag key");
            }
        }

        Ok(Flag {
            name: name.to_string(),
            description: self.opt_string(table, "description", &what)?.unwrap_or_default(),
            flag_type,
            variable: self.opt_string(table, "variable", &what)?,
            requires,
        })
    }

    fn requirement_set(
        &self,
        set: &toml::Table,
        what: &str,
    ) -> std::result::Result<RequirementSet, LoadError> {
        set.iter()
            .map(|(flag, required)| {
                Requirement::from_toml(required)
                    .map(|r| (flag.clone(), r))
                    .ok_or_else(|| {
                        self.schema(format!(
                            "{}: requirement on `{}` must be a scalar or a non-empty array of scalars",
                            what, flag
                        ))
                    })
            })
            .collect()
    }

    fn architecture(
        &self,
        name: &str,
        table: &toml::Table,
    ) -> std::result::Result<Architecture, LoadError> {
        let what = format!("architecture `{}`", name);
        Ok(Architecture {
            name: name.to_string(),
            family: self.opt_string(table, "family", &what)?,
            aliases: self.string_list(table, "aliases", &what)?.unwrap_or_default(),
            overlay: self.overlay(table, ARCHITECTURE_KEYS, &what)?,
        })
    }

    fn platform(
        &mut self,
        name: &str,
        table: &toml::Table,
    ) -> std::result::Result<Platform, LoadError> {
        let what = format!("platform `{}`", name);

        let architectures = self
            .string_list(table, "architectures", &what)?
            .ok_or_else(|| self.schema(format!("{} declares no `architectures`", what)))?;
        if architectures.is_empty() {
            return Err(self.schema(format!("{} must support at least one architecture", what)));
        }

        let mut variations = Vec::new();
        if let Some(section) = table.get("variation").or_else(|| table.get("variant")) {
            let context = format!("{} variation", what);
            let entries = self.entries(section, EntityKind::Variation, &context)?;
            for (variation, entry) in self.dedup(entries, &context)? {
                variations.push(self.variation(name, variation, entry)?);
            }
        }

        Ok(Platform {
            name: name.to_string(),
            architectures,
            variations,
            overlay: self.overlay(table, PLATFORM_KEYS, &what)?,
        })
    }

    fn variation(
        &mut self,
        platform: &str,
        name: &str,
        table: &toml::Table,
    ) -> std::result::Result<Variation, LoadError> {
        let what = format!("variation `{}` of platform `{}`", name, platform);

        let architectures = self.string_list(table, "architectures", &what)?;
        if architectures.as_ref().is_some_and(|a| a.is_empty()) {
            return Err(self.schema(format!("{} overrides `architectures` with an empty list", what)));
        }

        let declared_platform = self.opt_string(table, "platform", &what)?;
        if let Some(declared) = &declared_platform
            && declared != platform
        {
            self.warnings.push(CatalogueWarning::warning(
                Some(name),
                format!("{} redeclares its platform as `{}`", what, declared),
            ));
        }

        Ok(Variation {
            name: name.to_string(),
            platform: declared_platform,
            architecture: self.opt_string(table, "architecture", &what)?,
            architectures,
            overlay: self.overlay(table, VARIATION_KEYS, &what)?,
        })
    }

    fn project(&self, name: &str, table: &toml::Table) -> std::result::Result<Project, LoadError> {
        let what = format!("project `{}`", name);

        let repository = self
            .opt_string(table, "repository", &what)?
            .map(|r| {
                r.parse()
                    .map_err(|e: String| self.schema(format!("{}: {}", what, e)))
            })
            .transpose()?;

        let source_directory = match self.opt_string(table, "source-directory", &what)? {
            Some(dir) => Some(dir),
            None => self.opt_string(table, "source-dir", &what)?,
        };
        let root_server = match self.opt_string(table, "root-server", &what)? {
            Some(server) => Some(server),
            None => self.opt_string(table, "rootserver", &what)?,
        };
        let command_line = match self.string_list(table, "command-line", &what)? {
            Some(flags) => flags,
            None => self.string_list(table, "cmdline", &what)?.unwrap_or_default(),
        };

        Ok(Project {
            name: name.to_string(),
            repository,
            source_directory: source_directory.map(Into::into),
            root_server,
            exit_phrase: self.opt_string(table, "exit-phrase", &what)?,
            command_line,
            overlay: self.overlay(table, PROJECT_KEYS, &what)?,
        })
    }

    fn overlay(
        &self,
        table: &toml::Table,
        reserved: &[&str],
        what: &str,
    ) -> std::result::Result<Overlay, LoadError> {
        table
            .iter()
            .filter(|(key, _)| !reserved.contains(&key.as_str()))
            .map(|(flag, value)| {
                Value::from_toml(value).map(|v| (flag.clone(), v)).ok_or_else(|| {
                    self.schema(format!(
                        "{}: value for flag `{}` must be a boolean, string or integer (quote other literals)",
                        what, flag
                    ))
                })
            })
            .collect()
    }

    fn opt_string(
        &self,
        table: &toml::Table,
        key: &str,
        what: &str,
    ) -> std::result::Result<Option<String>, LoadError> {
        match table.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.schema(format!("{}: `{}` must be a string", what, key))),
        }
    }

    fn string_list(
        &self,
        table: &toml::Table,
        key: &str,
        what: &str,
    ) -> std::result::Result<Option<Vec<String>>, LoadError> {
        match table.get(key) {
            None => Ok(None),
            Some(toml::Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        self.schema(format!("{}: `{}` must contain only strings", what, key))
                    })
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(self.schema(format!("{}: `{}` must be an array of strings", what, key))),
        }
    }
}

/// Entry contents without the `name` key used by the array shape
fn without_name(table: &toml::Table) -> toml::Table {
    let mut table = table.clone();
    table.remove("name");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_and_array_shapes_agree() {
        let nested = Document::from_toml_str(
            "nested",
            r#"
[platform.tx2]
architectures = ["aarch64"]
has-smp = true
"#,
        )
        .unwrap();
        let listed = Document::from_toml_str(
            "listed",
            r#"
[[platform]]
name = "tx2"
architectures = ["aarch64"]
has-smp = true
"#,
        )
        .unwrap();
        assert_eq!(nested.platforms, listed.platforms);
    }

    #[test]
    fn test_flag_definition() {
        let doc = Document::from_toml_str(
            "flags",
            r#"
[flag.hypervisor]
description = "Hypervisor support"
variable = "KernelArmHypervisorSupport"
requires = [{ arm = true, has-hypervisor = true }, { x86 = true, has-vtx = true }]
"#,
        )
        .unwrap();
        let flag = &doc.flags[0];
        assert_eq!(flag.name, "hypervisor");
        assert_eq!(flag.flag_type, FlagType::Boolean);
        assert_eq!(flag.variable.as_deref(), Some("KernelArmHypervisorSupport"));
        assert_eq!(flag.requires.len(), 2);
        assert!(flag.requires[0].contains_key("has-hypervisor"));
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let doc = Document::from_toml_str(
            "order",
            r#"
[flag.zeta]
[flag.alpha]
[flag.mid]
"#,
        )
        .unwrap();
        let names: Vec<_> = doc.flags.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_yaml_declaration_order_is_preserved() {
        let doc = Document::from_yaml_str(
            "order",
            r#"
flag:
  zeta: {}
  alpha: {}
  mid: {}
platform:
  second:
    architectures: [aarch64]
  first:
    architectures: [aarch64]
"#,
        )
        .unwrap();
        let flags: Vec<_> = doc.flags.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(flags, vec!["zeta", "alpha", "mid"]);
        let platforms: Vec<_> = doc.platforms.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(platforms, vec!["second", "first"]);
    }

    #[test]
    fn test_unknown_keys_are_tolerated() {
        let doc = Document::from_toml_str(
            "unknown",
            r#"
comment = "not a section"

[flag.release]
variable = "RELEASE"
colour = "blue"
"#,
        )
        .unwrap();
        assert_eq!(doc.flags.len(), 1);
    }

    #[test]
    fn test_malformed_type_is_schema_error() {
        let err = Document::from_toml_str("bad", "[flag.release]\nvariable = 3\n").unwrap_err();
        assert_eq!(err.kind, LoadErrorKind::SchemaError);
        assert!(err.detail.contains("variable"));
    }

    #[test]
    fn test_platform_without_architectures_is_rejected() {
        let err =
            Document::from_toml_str("bad", "[platform.pc99]\nhas-smp = true\n").unwrap_err();
        assert_eq!(err.kind, LoadErrorKind::SchemaError);

        let err =
            Document::from_toml_str("bad", "[platform.pc99]\narchitectures = []\n").unwrap_err();
        assert!(err.detail.contains("at least one architecture"));
    }

    #[test]
    fn test_overlay_rejects_arrays() {
        let err = Document::from_toml_str(
            "bad",
            "[platform.pc99]\narchitectures = [\"x86_64\"]\nsmp = [true]\n",
        )
        .unwrap_err();
        assert_eq!(err.kind, LoadErrorKind::SchemaError);
        assert!(err.detail.contains("smp"));
    }

    #[test]
    fn test_identical_duplicate_variation_warns() {
        let doc = Document::from_toml_str(
            "dup",
            r#"
[[platform]]
name = "imx8"
architectures = ["aarch64"]

[[platform.variation]]
name = "imx8mm-evk"
arm-platform = "imx8mm"

[[platform.variation]]
name = "imx8mm-evk"
arm-platform = "imx8mm"
"#,
        )
        .unwrap();
        assert_eq!(doc.platforms[0].variations.len(), 1);
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn test_conflicting_duplicate_variation_fails() {
        let err = Document::from_toml_str(
            "dup",
            r#"
[[platform]]
name = "imx8"
architectures = ["aarch64"]

[[platform.variation]]
name = "imx8mm-evk"
arm-platform = "imx8mm"

[[platform.variation]]
name = "imx8mm-evk"
arm-platform = "imx8mq"
"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, LoadErrorKind::DuplicateName);
    }

    #[test]
    fn test_project_aliases() {
        let doc = Document::from_toml_str(
            "project",
            r#"
[project.sel4test]
repository = "seL4/sel4test-manifest"
rootserver = "sel4test-driver"
source-dir = "projects/sel4test"
cmdline = ["release", "mcs"]
release = false
"#,
        )
        .unwrap();
        let project = &doc.projects[0];
        assert_eq!(project.root_server.as_deref(), Some("sel4test-driver"));
        assert_eq!(project.command_line, vec!["release", "mcs"]);
        assert_eq!(project.overlay.get("release"), Some(&Value::Boolean(false)));
        assert_eq!(project.overlay.len(), 1);
    }

    #[test]
    fn test_float_overlay_value_is_a_schema_error() {
        let err = Document::from_toml_str(
            "float",
            "[platform.pc99]\narchitectures = [\"x86_64\"]\nclock-ratio = 1.0\n",
        )
        .unwrap_err();
        assert_eq!(err.kind, LoadErrorKind::SchemaError);
        assert!(err.detail.contains("clock-ratio"));

        let quoted = Document::from_toml_str(
            "float",
            "[platform.pc99]\narchitectures = [\"x86_64\"]\nclock-ratio = \"1.0\"\n",
        )
        .unwrap();
        assert_eq!(
            quoted.platforms[0].overlay.get("clock-ratio"),
            Some(&Value::Text("1.0".into()))
        );
    }

    #[test]
    fn test_malformed_repository() {
        let err = Document::from_toml_str(
            "project",
            "[project.x]\nrepository = \"seL4/sel4test.git\"\n",
        )
        .unwrap_err();
        assert_eq!(err.kind, LoadErrorKind::SchemaError);
    }

    #[test]
    fn test_yaml_document() {
        let doc = Document::from_yaml_str(
            "yaml",
            r#"
docker-image: example/image
platform:
  spike:
    architectures: [riscv64]
    has-simulator: true
"#,
        )
        .unwrap();
        assert_eq!(doc.defaults.docker_image(), "example/image");
        assert_eq!(
            doc.platforms[0].overlay.get("has-simulator"),
            Some(&Value::Boolean(true))
        );
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(DocumentFormat::from_path(Path::new("s4.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new(".s4")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("s4.toml")), DocumentFormat::Toml);
    }
}
