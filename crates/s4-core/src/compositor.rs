//! Layer compositor
//!
//! Builds a [`FlagTable`] from a [`Selection`] by applying overlays in
//! order of increasing precedence:
//!
//! 1. Architecture: `architecture`, `architecture-family`, then its overlay
//! 2. Platform: `kernel-platform`, `platform`, then its overlay
//! 3. Variation: `platform` renamed to the variation, then its overlay
//! 4. Project: fills flags that no platform or variation assigned
//! 5. Command line: explicit settings for eligible flags
//!
//! Every selection problem is detected before the first assignment.

use serde::Serialize;

use s4_catalogue::{Architecture, Catalogue, FlagType, Overlay, Platform, Project, Value, Variation};

use crate::error::SelectionError;
use crate::selection::{CommandLineSetting, Selection};
use crate::table::{FlagTable, Layer};

/// Something worth telling the user that did not stop resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveWarning {
    pub flag: String,
    pub message: String,
}

impl std::fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Outcome of composing all layers for one selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub table: FlagTable,
    pub warnings: Vec<ResolveWarning>,
}

/// Catalogue entities named by a selection
struct Selected<'c> {
    project: &'c Project,
    platform: &'c Platform,
    variation: Option<&'c Variation>,
    architecture: &'c Architecture,
    /// Command-line settings with their literals parsed
    settings: Vec<(&'c str, Value)>,
}

/// Apply every layer of `selection` onto an empty flag table
pub fn resolve(catalogue: &Catalogue, selection: &Selection) -> Result<Resolution, SelectionError> {
    let selected = select(catalogue, selection)?;
    let mut table = FlagTable::new();
    let mut warnings = Vec::new();

    let architecture = selected.architecture;
    tracing::debug!(architecture = %architecture.name, "Applying architecture layer");
    table.assign("architecture", Value::from(architecture.name.as_str()), Layer::Architecture);
    if let Some(family) = &architecture.family {
        table.assign("architecture-family", Value::from(family.as_str()), Layer::Architecture);
    }
    apply(&mut table, &architecture.overlay, Layer::Architecture);

    let platform = selected.platform;
    tracing::debug!(platform = %platform.name, "Applying platform layer");
    table.assign("kernel-platform", Value::from(platform.name.as_str()), Layer::Platform);
    table.assign("platform", Value::from(platform.name.as_str()), Layer::Platform);
    apply(&mut table, &platform.overlay, Layer::Platform);

    if let Some(variation) = selected.variation {
        tracing::debug!(variation = %variation.name, "Applying variation layer");
        table.assign("platform", Value::from(variation.name.as_str()), Layer::Variation);
        apply(&mut table, &variation.overlay, Layer::Variation);
    }

    let project = selected.project;
    tracing::debug!(project = %project.name, "Applying project layer");
    for (flag, value) in project.overlay.iter() {
        if let Some(kept) = table.fill(flag, value.clone(), Layer::Project) {
            warnings.push(ResolveWarning {
                flag: flag.to_string(),
                message: format!(
                    "Project '{}' default for '{}' is overridden by the {} layer",
                    project.name, flag, kept
                ),
            });
        }
    }

    tracing::debug!(count = selected.settings.len(), "Applying command-line layer");
    for (flag, value) in selected.settings {
        if table.layer(flag) == Some(Layer::CommandLine) {
            warnings.push(ResolveWarning {
                flag: flag.to_string(),
                message: format!("Flag '{}' is set more than once; the last setting wins", flag),
            });
        }
        table.assign(flag, value, Layer::CommandLine);
    }

    Ok(Resolution { table, warnings })
}

fn apply(table: &mut FlagTable, overlay: &Overlay, layer: Layer) {
    for (flag, value) in overlay.iter() {
        table.assign(flag, value.clone(), layer);
    }
}

/// Look up and cross-check every entity the selection names
fn select<'c>(
    catalogue: &'c Catalogue,
    selection: &Selection,
) -> Result<Selected<'c>, SelectionError> {
    let project = catalogue
        .project(&selection.project)
        .ok_or_else(|| SelectionError::UnknownProject {
            project: selection.project.clone(),
        })?;

    let choice = &selection.platform;
    let platform =
        catalogue
            .platform(&choice.platform)
            .ok_or_else(|| SelectionError::UnknownPlatform {
                platform: choice.platform.clone(),
            })?;

    let variation = match &choice.variation {
        Some(name) => Some(platform.variation(name).ok_or_else(|| {
            SelectionError::UnknownVariation {
                platform: platform.name.clone(),
                variation: name.clone(),
            }
        })?),
        None => None,
    };

    let architecture = catalogue
        .architecture(&selection.architecture)
        .ok_or_else(|| SelectionError::UnknownArchitecture {
            architecture: selection.architecture.clone(),
        })?;

    let supported = platform.supported_architectures(variation);
    if !supported.iter().any(|a| architecture.answers_to(a)) {
        return Err(SelectionError::UnsupportedArchitectureForPlatform {
            architecture: architecture.name.clone(),
            platform: choice.to_string(),
            supported: supported.to_vec(),
        });
    }

    if let Some(variation) = variation {
        if let Some(declared) = &variation.platform
            && declared != &platform.name
        {
            return Err(SelectionError::VariationPlatformMismatch {
                variation: variation.name.clone(),
                declared: declared.clone(),
                selected: platform.name.clone(),
            });
        }
        if let Some(required) = &variation.architecture
            && !architecture.answers_to(required)
        {
            return Err(SelectionError::VariationArchitectureMismatch {
                variation: variation.name.clone(),
                required: required.clone(),
                selected: architecture.name.clone(),
            });
        }
    }

    let settings = selection
        .settings
        .iter()
        .map(|setting| command_line_value(catalogue, project, setting))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Selected {
        project,
        platform,
        variation,
        architecture,
        settings,
    })
}

/// Check eligibility and parse the literal of one command-line setting
fn command_line_value<'c>(
    catalogue: &'c Catalogue,
    project: &Project,
    setting: &CommandLineSetting,
) -> Result<(&'c str, Value), SelectionError> {
    let name = setting.flag();
    let Some(flag) = catalogue.flag(name) else {
        return Err(SelectionError::UnknownFlag {
            flag: name.to_string(),
        });
    };
    if !project.is_eligible(name) {
        return Err(SelectionError::IneligibleCommandLineFlag {
            flag: name.to_string(),
            project: project.name.clone(),
        });
    }

    let mismatch = |operation| SelectionError::CommandLineTypeMismatch {
        flag: name.to_string(),
        flag_type: flag.flag_type,
        operation,
    };
    let value = match (setting, flag.flag_type) {
        (CommandLineSetting::Enable { .. }, FlagType::Boolean) => Value::Boolean(true),
        (CommandLineSetting::Disable { .. }, FlagType::Boolean) => Value::Boolean(false),
        (CommandLineSetting::Enable { .. }, _) => return Err(mismatch("enable")),
        (CommandLineSetting::Disable { .. }, _) => return Err(mismatch("disable")),
        (CommandLineSetting::Set { value, .. }, flag_type) => Value::parse_literal(flag_type, value)
            .ok_or_else(|| SelectionError::InvalidCommandLineValue {
                flag: name.to_string(),
                value: value.clone(),
                expected: flag_type,
            })?,
    };
    Ok((flag.name.as_str(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::PlatformChoice;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use s4_catalogue::{Document, load};
    use s4_test_utils::fixtures;

    fn catalogue() -> Catalogue {
        load(vec![Document::from_toml_str("scenario", fixtures::SCENARIO).unwrap()]).unwrap()
    }

    fn select_q(platform: PlatformChoice) -> Selection {
        Selection::new("q", platform, "a64")
    }

    #[test]
    fn test_derived_flags() {
        let resolution = resolve(&catalogue(), &select_q(PlatformChoice::platform("p"))).unwrap();
        let table = resolution.table;
        assert_eq!(table.get("architecture"), Some(&Value::from("a64")));
        assert_eq!(table.get("architecture-family"), Some(&Value::from("arm")));
        assert_eq!(table.get("platform"), Some(&Value::from("p")));
        assert_eq!(table.get("kernel-platform"), Some(&Value::from("p")));
    }

    #[test]
    fn test_variation_renames_platform_and_overrides() {
        let resolution =
            resolve(&catalogue(), &select_q(PlatformChoice::variation("board", "v"))).unwrap();
        let table = resolution.table;
        assert_eq!(table.get("platform"), Some(&Value::from("v")));
        assert_eq!(table.get("kernel-platform"), Some(&Value::from("board")));
        assert_eq!(table.get("arm-platform"), Some(&Value::from("v-board")));
        assert_eq!(table.layer("arm-platform"), Some(Layer::Variation));
    }

    #[test]
    fn test_project_fills_gaps_only() {
        let resolution = resolve(&catalogue(), &select_q(PlatformChoice::platform("p"))).unwrap();
        let table = &resolution.table;
        // Platform wins over the project default
        assert_eq!(table.get("board-name"), Some(&Value::from("from-platform")));
        // Project default overrides the architecture layer
        assert_eq!(
            table.get("cross-compiler-prefix"),
            Some(&Value::from("project-prefix-"))
        );
        // Project default fills an unassigned flag
        assert_eq!(table.get("release"), Some(&Value::Boolean(true)));
        assert_eq!(resolution.warnings.len(), 1);
        assert_eq!(resolution.warnings[0].flag, "board-name");
    }

    #[test]
    fn test_command_line_wins() {
        let selection = select_q(PlatformChoice::platform("p"))
            .disable("release")
            .set("board-name", "from-cli");
        let table = resolve(&catalogue(), &selection).unwrap().table;
        assert_eq!(table.get("release"), Some(&Value::Boolean(false)));
        assert_eq!(table.get("board-name"), Some(&Value::from("from-cli")));
        assert_eq!(table.layer("board-name"), Some(Layer::CommandLine));
    }

    #[test]
    fn test_repeated_setting_warns_and_last_wins() {
        let selection = select_q(PlatformChoice::platform("p"))
            .enable("release")
            .set("release", "off");
        let resolution = resolve(&catalogue(), &selection).unwrap();
        assert_eq!(resolution.table.get("release"), Some(&Value::Boolean(false)));
        assert!(resolution.warnings.iter().any(|w| w.message.contains("more than once")));
    }

    #[test]
    fn test_architecture_alias() {
        let selection = Selection::new("q", PlatformChoice::platform("p"), "arm64");
        let table = resolve(&catalogue(), &selection).unwrap().table;
        assert_eq!(table.get("architecture"), Some(&Value::from("a64")));
    }

    #[rstest]
    #[case::project(Selection::new("nope", PlatformChoice::platform("p"), "a64"), "Unknown project 'nope'")]
    #[case::platform(Selection::new("q", PlatformChoice::platform("nope"), "a64"), "Unknown platform 'nope'")]
    #[case::variation(
        Selection::new("q", PlatformChoice::variation("board", "nope"), "a64"),
        "Platform 'board' has no variation 'nope'"
    )]
    #[case::architecture(Selection::new("q", PlatformChoice::platform("p"), "sparc"), "Unknown architecture 'sparc'")]
    fn test_unknown_names(#[case] selection: Selection, #[case] message: &str) {
        let err = resolve(&catalogue(), &selection).unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_specific_selection_errors() {
        let catalogue = catalogue();
        let err = |s: Selection| resolve(&catalogue, &s).unwrap_err();

        assert!(matches!(
            err(Selection::new("q", PlatformChoice::platform("p"), "a32")),
            SelectionError::UnsupportedArchitectureForPlatform { .. }
        ));
        assert!(matches!(
            err(Selection::new("q", PlatformChoice::variation("board", "v32"), "a64")),
            SelectionError::VariationArchitectureMismatch { .. }
        ));
        assert!(matches!(
            err(Selection::new("q", PlatformChoice::variation("board", "renamed"), "a64")),
            SelectionError::VariationPlatformMismatch { .. }
        ));
        assert!(matches!(
            err(select_q(PlatformChoice::platform("p")).enable("arm-platform")),
            SelectionError::IneligibleCommandLineFlag { .. }
        ));
        assert!(matches!(
            err(select_q(PlatformChoice::platform("p")).disable("nope")),
            SelectionError::UnknownFlag { .. }
        ));
        assert!(matches!(
            err(select_q(PlatformChoice::platform("p")).set("release", "maybe")),
            SelectionError::InvalidCommandLineValue { .. }
        ));
        assert!(matches!(
            err(select_q(PlatformChoice::platform("p")).enable("board-name")),
            SelectionError::CommandLineTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_locked_project_rejects_every_setting() {
        let selection = Selection::new("locked", PlatformChoice::platform("p"), "a64").enable("release");
        assert!(matches!(
            resolve(&catalogue(), &selection).unwrap_err(),
            SelectionError::IneligibleCommandLineFlag { .. }
        ));
    }
}
