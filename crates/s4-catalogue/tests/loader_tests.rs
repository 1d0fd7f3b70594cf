//! Catalogue loading across multiple sources

use pretty_assertions::assert_eq;
use rstest::rstest;
use s4_catalogue::{
    CatalogueLoader, CatalogueSource, Document, DocumentFormat, LoadErrorKind, Value, WarnLevel,
    load,
};
use s4_test_utils::{TestWorkspace, fixtures};

#[test]
fn test_scenario_fixture_loads() {
    let catalogue = CatalogueLoader::new()
        .inline("scenario", fixtures::SCENARIO)
        .load()
        .unwrap();

    let board = catalogue.platform("board").unwrap();
    assert_eq!(
        board.variation("v").unwrap().overlay.get("arm-platform"),
        Some(&Value::from("v-board"))
    );
    assert_eq!(catalogue.architecture("arm64").unwrap().name, "a64");

    // The `renamed` variation redeclares its platform
    assert!(
        catalogue
            .warnings()
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("elsewhere"))
    );
}

#[test]
fn test_user_overlay_replaces_platform() {
    let workspace = TestWorkspace::new();
    let overlay = workspace.write_overlay("s4.toml", fixtures::P2_WITH_FEATURE_X);

    let catalogue = CatalogueLoader::new()
        .inline("scenario", fixtures::SCENARIO)
        .file(&overlay)
        .load()
        .unwrap();

    let p2 = catalogue.platform("p2").unwrap();
    assert_eq!(p2.overlay.get("has-feature-x"), Some(&Value::Boolean(true)));
    // Replaced as a whole: `has-b` came from the original declaration only
    assert!(!p2.overlay.contains("has-b"));
}

#[test]
fn test_workspace_overlay_discovery() {
    let workspace = TestWorkspace::new();
    workspace.write_overlay(".s4.toml", fixtures::P2_WITH_FEATURE_X);
    workspace.write_overlay("unrelated.toml", "this is = not [valid");

    let loader = CatalogueLoader::new()
        .inline("scenario", fixtures::SCENARIO)
        .overlays_in(workspace.root());
    assert_eq!(loader.sources().len(), 2);
    assert!(matches!(loader.sources()[1], CatalogueSource::File(_)));
    loader.load().unwrap();
}

#[test]
fn test_easy_settings_from_workspace() {
    let workspace = TestWorkspace::new();
    workspace.add_source_dir("projects/q", fixtures::EASY_SETTINGS);

    let catalogue = CatalogueLoader::new()
        .inline("scenario", fixtures::SCENARIO)
        .easy_settings(workspace.root())
        .load()
        .unwrap();

    // Declared by easy-settings only
    let extra = catalogue.flag("lib-extra-thing").unwrap();
    assert_eq!(extra.variable.as_deref(), Some("LibExtraThing"));
    // Declared by both; the scenario wins and keeps the first position
    assert_eq!(catalogue.flags()[0].name, "platform");
    assert_eq!(catalogue.flag("release").unwrap().variable.as_deref(), Some("RELEASE"));
}

#[rstest]
#[case("[flag.x]\ntype = \"integer\"\n", LoadErrorKind::SchemaError)]
#[case("[flag.x]\nrequires = [{ y = [] }]\n", LoadErrorKind::SchemaError)]
#[case("[project.x]\ncommand-line = [\"nope\"]\n", LoadErrorKind::DanglingReference)]
#[case("[flag.x]\nrequires = [{ y = \"text\" }]\n", LoadErrorKind::DanglingReference)]
#[case(
    "[[flag]]\nname = \"x\"\nvariable = \"A\"\n[[flag]]\nname = \"x\"\nvariable = \"B\"\n",
    LoadErrorKind::DuplicateName
)]
fn test_load_error_kinds(#[case] content: &str, #[case] expected: LoadErrorKind) {
    let err = Document::parse("case", content, DocumentFormat::Toml)
        .and_then(|document| load(vec![document]))
        .unwrap_err();
    assert_eq!(err.kind, expected, "{}", err);
    assert_eq!(err.document, "case");
}

#[test]
fn test_yaml_and_toml_overlays_agree() {
    let toml = Document::from_toml_str(
        "toml",
        "[flag.release]\nvariable = \"RELEASE\"\n[project.q]\ncommand-line = [\"release\"]\n",
    )
    .unwrap();
    let yaml = Document::from_yaml_str(
        "yaml",
        "flag:\n  release:\n    variable: RELEASE\nproject:\n  q:\n    command-line: [release]\n",
    )
    .unwrap();
    assert_eq!(toml.flags, yaml.flags);
    assert_eq!(toml.projects, yaml.projects);
}

#[test]
fn test_builtin_with_user_overlay() {
    let workspace = TestWorkspace::new();
    let overlay = workspace.write_overlay(
        "s4.toml",
        r#"
docker-image = "example.org/custom"

[project.my-app]
repository = "me/my-app-manifest"
command-line = ["release"]
"#,
    );

    let catalogue = CatalogueLoader::new()
        .with_builtin()
        .file(overlay)
        .load()
        .unwrap();
    assert_eq!(catalogue.defaults().docker_image(), "example.org/custom");
    assert!(catalogue.project("my-app").is_some());
    assert!(catalogue.project("sel4test").is_some());
}
