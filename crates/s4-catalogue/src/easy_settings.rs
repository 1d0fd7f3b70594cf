//! Flag definitions discovered from a workspace `easy-settings.cmake`
//!
//! Project checkouts ship an `easy-settings.cmake` listing the cache
//! variables users are expected to tweak, one per line:
//!
//! ```cmake
//! set(SIMULATION OFF CACHE BOOL "Include only simulation compatible tests")
//! ```
//!
//! Each such line becomes a flag definition. The resulting document is the
//! lowest-precedence catalogue source, so any catalogue declaring the same
//! flag replaces it.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::model::Flag;
use crate::value::FlagType;

/// File name of the settings hint in a workspace root
pub const EASY_SETTINGS: &str = "easy-settings.cmake";

static SETTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^set\((?P<variable>[A-Za-z][A-Za-z0-9_]*)( [^ ]+){2} (?P<type>[A-Z]+) "(?P<description>[^"]*)"\)$"#,
    )
    .expect("Invalid easy-settings regex")
});

/// One cache variable declared in `easy-settings.cmake`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EasySetting {
    pub variable: String,
    /// CMake cache type, e.g. `BOOL` or `STRING`
    pub cmake_type: String,
    pub description: String,
}

impl EasySetting {
    /// Flag name derived from the variable name
    pub fn flag_name(&self) -> String {
        kebab_case(&self.variable)
    }

    pub fn to_flag(&self) -> Flag {
        let flag_type = match self.cmake_type.as_str() {
            "BOOL" => FlagType::Boolean,
            _ => FlagType::String,
        };
        Flag::new(self.flag_name(), self.description.clone())
            .with_type(flag_type)
            .with_variable(self.variable.clone())
    }
}

/// Extract the settings from file content; non-matching lines are skipped
pub fn parse(content: &str) -> Vec<EasySetting> {
    content
        .lines()
        .filter_map(|line| SETTING.captures(line.trim()))
        .map(|captures| EasySetting {
            variable: captures["variable"].to_string(),
            cmake_type: captures["type"].to_string(),
            description: captures["description"].to_string(),
        })
        .collect()
}

/// Path of the settings hint inside `workspace`, if present
pub fn discover(workspace: &Path) -> Option<PathBuf> {
    let path = workspace.join(EASY_SETTINGS);
    path.is_file().then_some(path)
}

/// Read the settings hint into a catalogue document
pub fn read_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut document = Document::empty(path.display().to_string());
    document.flags = parse(&content).iter().map(EasySetting::to_flag).collect();
    tracing::debug!(?path, flags = document.flags.len(), "Read easy settings");
    Ok(document)
}

/// Source directory implied by the settings hint, relative to the workspace
///
/// The hint is usually a symlink into the project's source tree, so the
/// directory holding its resolved target is the source directory.
pub fn inferred_source_directory(workspace: &Path) -> Result<Option<PathBuf>> {
    let Some(hint) = discover(workspace) else {
        return Ok(None);
    };
    let root = workspace.canonicalize().map_err(|e| Error::io(workspace, e))?;
    let target = hint.canonicalize().map_err(|e| Error::io(&hint, e))?;
    let source = target
        .parent()
        .and_then(|dir| dir.strip_prefix(&root).ok())
        .map(Path::to_path_buf);
    Ok(source)
}

/// Convert `SCREAMING_SNAKE` or `PascalCase` variable names to kebab case
pub fn kebab_case(variable: &str) -> String {
    if variable.chars().all(|c| c.is_uppercase() || c.is_ascii_digit() || c == '_') {
        return variable.to_lowercase().replace('_', "-");
    }

    let mut name = String::with_capacity(variable.len() + 4);
    for (i, c) in variable.chars().enumerate() {
        if c == '_' {
            name.push('-');
        } else if c.is_uppercase() {
            if i > 0 && !name.ends_with('-') {
                name.push('-');
            }
            name.extend(c.to_lowercase());
        } else {
            name.push(c);
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const SAMPLE: &str = r#"
set(PLATFORM "x86_64" CACHE STRING "Platform to test")
set(SIMULATION OFF CACHE BOOL "Include only simulation compatible tests")
set(KernelSel4Arch "" CACHE STRING "aarch32, aarch64, ia32, x86_64")
  set(RELEASE OFF CACHE BOOL "Performance optimized build")
include(settings.cmake)
set(Broken OFF CACHE BOOL)
"#;

    #[test]
    fn test_parse_settings() {
        let settings = parse(SAMPLE);
        let names: Vec<_> = settings.iter().map(|s| s.flag_name()).collect();
        assert_eq!(
            names,
            vec!["platform", "simulation", "kernel-sel4-arch", "release"]
        );
    }

    #[test]
    fn test_setting_to_flag() {
        let settings = parse(SAMPLE);
        let flag = settings[1].to_flag();
        assert_eq!(flag.flag_type, FlagType::Boolean);
        assert_eq!(flag.variable.as_deref(), Some("SIMULATION"));
        assert_eq!(flag.description, "Include only simulation compatible tests");
        assert_eq!(settings[0].to_flag().flag_type, FlagType::String);
    }

    #[rstest]
    #[case("SIMULATION", "simulation")]
    #[case("LIB_SEL4_TEST", "lib-sel4-test")]
    #[case("KernelArmHypervisorSupport", "kernel-arm-hypervisor-support")]
    #[case("Kernel_Debug", "kernel-debug")]
    fn test_kebab_case(#[case] variable: &str, #[case] expected: &str) {
        assert_eq!(kebab_case(variable), expected);
    }

    #[test]
    fn test_inferred_source_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(inferred_source_directory(dir.path()).unwrap(), None);

        let source = dir.path().join("projects/sel4test");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join(EASY_SETTINGS), SAMPLE).unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(
            source.join(EASY_SETTINGS),
            dir.path().join(EASY_SETTINGS),
        )
        .unwrap();
        #[cfg(not(unix))]
        std::fs::copy(source.join(EASY_SETTINGS), dir.path().join(EASY_SETTINGS)).unwrap();

        let inferred = inferred_source_directory(dir.path()).unwrap();
        #[cfg(unix)]
        assert_eq!(inferred, Some(PathBuf::from("projects/sel4test")));
        #[cfg(not(unix))]
        assert_eq!(inferred, Some(PathBuf::new()));
    }

    #[test]
    fn test_read_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EASY_SETTINGS);
        std::fs::write(&path, SAMPLE).unwrap();
        let document = read_document(&path).unwrap();
        assert_eq!(document.flags.len(), 4);
    }
}
