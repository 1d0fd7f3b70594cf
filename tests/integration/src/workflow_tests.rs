//! Workspace workflow tests: init → configure → build → run, with recorded tool runs
//!
//! No external tool is started; a `RecordingRunner` stands in for repo,
//! docker, cmake, ninja and the machine queue. The checkout is simulated by
//! writing the project's `easy-settings.cmake` into the workspace, the build
//! by writing its boot images.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use s4_catalogue::{Catalogue, CatalogueLoader};
use s4_core::{EmitPolicy, PlatformChoice, ProjectDescriptor, Selection, configure};
use s4_orchestrate::{
    BuildDirectory, Context, Error, Orchestrator, RecordingRunner, Toolbox, Workspace,
};
use s4_test_utils::{TestWorkspace, fixtures};

fn catalogue_for(workspace: &TestWorkspace) -> Catalogue {
    CatalogueLoader::new()
        .with_builtin()
        .easy_settings(workspace.root())
        .load()
        .unwrap()
}

fn sel4test(catalogue: &Catalogue) -> ProjectDescriptor {
    ProjectDescriptor::new(catalogue.project("sel4test").unwrap(), catalogue)
}

/// Initialise `test` as a sel4test workspace and simulate the checkout
fn init(runner: &RecordingRunner, test: &TestWorkspace) -> Workspace {
    let catalogue = catalogue_for(test);
    let orchestrator =
        Orchestrator::new(runner, Toolbox::assumed(), catalogue.defaults(), test.root())
            .interactive(false);
    let workspace = orchestrator
        .init_workspace(&sel4test(&catalogue), test.root())
        .unwrap();
    test.add_source_dir("projects/sel4test", fixtures::EASY_SETTINGS);
    workspace
}

#[test]
fn init_configure_build() {
    let test = TestWorkspace::new();
    let runner = RecordingRunner::new();
    let workspace = init(&runner, &test);
    test.assert_file_exists(".s4-workspace.toml");
    test.assert_file_exists(".sel4_cache");

    let catalogue = catalogue_for(&test);
    let orchestrator =
        Orchestrator::new(&runner, Toolbox::assumed(), catalogue.defaults(), test.root())
            .interactive(false);

    let selection =
        Selection::new("sel4test", PlatformChoice::platform("tx2"), "aarch64").enable("release");
    let config = configure(&catalogue, &selection, EmitPolicy::AllMapped).unwrap();
    let build = BuildDirectory::create(&workspace, &test.path("build"), selection.clone()).unwrap();
    orchestrator.configure(&build, &config).unwrap();
    orchestrator
        .build(&build, &["sel4test-driver".to_string()])
        .unwrap();

    let invocations = runner.invocations();
    let names: Vec<String> = invocations.iter().map(|i| i.name()).collect();
    assert_eq!(names, vec!["repo", "repo", "docker", "docker"]);

    assert_eq!(invocations[0].args[0], "init");
    assert_eq!(
        invocations[0].args[2],
        "https://github.com/seL4/sel4test-manifest.git"
    );
    assert_eq!(invocations[1].args, vec!["sync"]);

    let cmake = &invocations[2].args;
    let source = cmake.iter().position(|a| a == "-S").unwrap();
    assert_eq!(cmake[source + 1], "/workspace/projects/sel4test");
    assert!(cmake.contains(&"-DRELEASE:BOOL=ON".to_string()));
    assert!(cmake.contains(&"-DKernelPlatform:STRING=tx2".to_string()));
    // Declared only by easy-settings.cmake
    assert!(cmake.contains(&"-DLibExtraThing:BOOL=OFF".to_string()));

    let ninja = &invocations[3].args;
    assert_eq!(
        &ninja[ninja.len() - 2..],
        &["ninja".to_string(), "sel4test-driver".to_string()]
    );

    test.assert_file_contains("build/.s4-build.toml", "release");
    let reloaded = Workspace::load(test.root()).unwrap();
    assert_eq!(reloaded.builds().count(), 1);
}

#[test]
fn built_images_run_on_matching_hardware() {
    let test = TestWorkspace::new();
    let runner = RecordingRunner::new()
        .respond("name\tsel4_plat\tcomment\npc-2\tpc99\t\ntx2-1\ttx2\t\npc-1\tpc99\t\n")
        .respond("x86\tpc-1\tpc-2\n");
    let workspace = init(&runner, &test);

    let catalogue = catalogue_for(&test);
    let orchestrator =
        Orchestrator::new(&runner, Toolbox::assumed(), catalogue.defaults(), test.root())
            .interactive(false);
    let selection = Selection::new("sel4test", PlatformChoice::platform("pc99"), "amd64");
    let config = configure(&catalogue, &selection, EmitPolicy::AllMapped).unwrap();
    let build = BuildDirectory::create(&workspace, &test.path("build"), selection).unwrap();
    orchestrator.configure(&build, &config).unwrap();
    orchestrator.build(&build, &[]).unwrap();

    test.write_overlay("build/images/kernel-x86_64-pc99", "");
    test.write_overlay("build/images/sel4test-driver-image-x86_64-pc99", "");

    let system = orchestrator.run_on_hardware(&build, &config, None).unwrap();
    assert_eq!(system, "x86");

    let invocations = runner.invocations();
    let names: Vec<String> = invocations.iter().map(|i| i.name()).collect();
    assert_eq!(
        names,
        vec!["repo", "repo", "docker", "docker", "mq.sh", "mq.sh", "mq.sh"]
    );
    let run = invocations.last().unwrap();
    assert_eq!(
        run.args,
        vec![
            "run",
            "-c",
            "All is well in the universe",
            "-s",
            "x86",
            "-f",
            "images/kernel-x86_64-pc99",
            "-f",
            "images/sel4test-driver-image-x86_64-pc99",
        ]
    );
    assert_eq!(run.cwd.as_deref(), Some(test.path("build").as_path()));
}

#[test]
fn hardware_run_needs_built_images() {
    let test = TestWorkspace::new();
    let runner = RecordingRunner::new();
    let workspace = init(&runner, &test);

    let catalogue = catalogue_for(&test);
    let orchestrator =
        Orchestrator::new(&runner, Toolbox::assumed(), catalogue.defaults(), test.root());
    let selection = Selection::new("sel4test", PlatformChoice::platform("tx2"), "aarch64");
    let config = configure(&catalogue, &selection, EmitPolicy::AllMapped).unwrap();
    let build = BuildDirectory::create(&workspace, &test.path("build"), selection).unwrap();

    let before = runner.invocations().len();
    assert!(matches!(
        orchestrator.run_on_hardware(&build, &config, Some("tx2-1")),
        Err(Error::ImageMissing { .. })
    ));
    assert_eq!(runner.invocations().len(), before);
}

#[test]
fn build_directory_records_selection_not_table() {
    let test = TestWorkspace::new();
    let runner = RecordingRunner::new();
    let workspace = init(&runner, &test);

    let selection = Selection::new(
        "sel4test",
        PlatformChoice::variation("imx8", "imx8mm-evk"),
        "aarch64",
    )
    .disable("release");
    BuildDirectory::create(&workspace, &test.path("build"), selection.clone()).unwrap();

    let Some(Context::Build(build)) = Context::discover(&test.path("build")).unwrap() else {
        panic!("expected a build directory context");
    };
    assert_eq!(build.selection(), &selection);
    assert_eq!(build.workspace().project(), "sel4test");

    let state = test.read("build/.s4-build.toml");
    assert!(state.contains("imx8mm-evk"));
    assert!(!state.contains("KernelARMPlatform"));
}

#[test]
fn reconfigure_resolves_against_current_catalogue() {
    let test = TestWorkspace::new();
    let runner = RecordingRunner::new();
    let workspace = init(&runner, &test);

    let selection =
        Selection::new("sel4test", PlatformChoice::platform("tx2"), "aarch64").enable("smp");
    let mut build =
        BuildDirectory::create(&workspace, &test.path("build"), selection.clone()).unwrap();
    std::fs::write(test.path("build/CMakeCache.txt"), "").unwrap();

    // A workspace overlay that drops SMP support from tx2
    test.write_overlay(
        "s4.toml",
        "[platform.tx2]\narchitectures = [\"aarch64\"]\nhas-mcs = true\n",
    );
    let catalogue = CatalogueLoader::new()
        .with_builtin()
        .overlays_in(test.root())
        .easy_settings(test.root())
        .load()
        .unwrap();
    assert!(configure(&catalogue, build.selection(), EmitPolicy::AllMapped).is_err());

    build.reselect(selection.disable("smp")).unwrap();
    let config = configure(&catalogue, build.selection(), EmitPolicy::AllMapped).unwrap();

    let orchestrator =
        Orchestrator::new(&runner, Toolbox::assumed(), catalogue.defaults(), test.root())
            .interactive(false);
    orchestrator.configure(&build, &config).unwrap();

    let last = runner.invocations().pop().unwrap();
    assert!(!last.args.contains(&"-S".to_string()));
    assert!(last.args.contains(&"-DSMP:BOOL=OFF".to_string()));
    assert_eq!(last.args.last().map(String::as_str), Some("/build"));
}

#[test]
fn build_directory_outside_workspace() {
    let test = TestWorkspace::new();
    let runner = RecordingRunner::new();
    let workspace_dir = TestWorkspace::new();
    let catalogue = catalogue_for(&workspace_dir);
    let orchestrator =
        Orchestrator::new(&runner, Toolbox::assumed(), catalogue.defaults(), test.root());
    let workspace = orchestrator
        .init_workspace(&sel4test(&catalogue), workspace_dir.root())
        .unwrap();

    let selection = Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64");
    BuildDirectory::create(&workspace, &test.path("out"), selection).unwrap();

    let build = BuildDirectory::load(&test.path("out")).unwrap();
    assert_eq!(
        build.workspace().root().canonicalize().unwrap(),
        workspace_dir.root().canonicalize().unwrap()
    );
}

#[test]
fn init_refuses_non_empty_directory() {
    let test = TestWorkspace::new();
    test.write_overlay("stray.txt", "hello");
    let runner = RecordingRunner::new();
    let catalogue = catalogue_for(&test);
    let orchestrator =
        Orchestrator::new(&runner, Toolbox::assumed(), catalogue.defaults(), test.root());

    let result = orchestrator.init_workspace(&sel4test(&catalogue), test.root());
    assert!(matches!(result, Err(Error::WorkspaceNotEmpty { .. })));
    assert!(runner.invocations().is_empty());
    test.assert_missing(".s4-workspace.toml");
}

#[test]
fn build_of_other_project_is_refused() {
    let test = TestWorkspace::new();
    let runner = RecordingRunner::new();
    let workspace = init(&runner, &test);

    let selection = Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64");
    let mut build = BuildDirectory::create(&workspace, &test.path("build"), selection).unwrap();

    let other = Selection::new("sel4bench", PlatformChoice::platform("pc99"), "x86_64");
    assert!(matches!(
        build.reselect(other),
        Err(Error::ProjectMismatch { .. })
    ));
}

#[test]
fn project_descriptor_handoff() {
    let test = TestWorkspace::new();
    let catalogue = catalogue_for(&test);
    let descriptor = sel4test(&catalogue);

    assert_eq!(descriptor.root_server.as_deref(), Some("sel4test-driver"));
    assert_eq!(descriptor.exit_phrase, "All is well in the universe");

    let json = serde_json::to_value(&descriptor).unwrap();
    assert_eq!(json["repository"], "seL4/sel4test-manifest");
    assert_eq!(json.get("source-directory"), None);

    let workspace = Workspace::create("sel4test", &test.path("ws")).unwrap();
    std::fs::create_dir_all(test.path("ws/projects/sel4test")).unwrap();
    let declared = ProjectDescriptor {
        source_directory: Some(PathBuf::from("projects/sel4test")),
        ..descriptor
    };
    assert_eq!(
        workspace.source_directory(&declared).unwrap(),
        PathBuf::from("projects/sel4test")
    );
}
