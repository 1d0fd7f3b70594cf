//! Workspace commands: init, configure, build, run and update-image

use std::path::{Path, PathBuf};

use clap::ArgMatches;
use colored::Colorize;

use s4_core::{EmitPolicy, ProjectDescriptor, SelectionError, configure};
use s4_orchestrate::tools::MACHINE_QUEUE;
use s4_orchestrate::{
    BuildDirectory, BuildState, CommandRunner, Context, Orchestrator, ProcessRunner,
    RecordingRunner, Toolbox, find_on_path,
};

use super::{Environment, amend_selection, new_selection, print_plan, print_warnings};
use crate::cli::SelectionArgs;
use crate::error::Result;

/// Check a project out into a new workspace
pub fn run_init(env: &Environment, project: &str, dir: Option<&Path>, dry_run: bool) -> Result<()> {
    let catalogue = env.catalogue_for(None)?;
    let entity = catalogue
        .project(project)
        .ok_or_else(|| SelectionError::UnknownProject {
            project: project.into(),
        })?;
    let descriptor = ProjectDescriptor::new(entity, &catalogue);
    let path = env.cwd.join(dir.unwrap_or_else(|| Path::new(project)));

    if dry_run {
        let repository = descriptor.repository.as_ref().ok_or_else(|| {
            s4_orchestrate::Error::NoRepository {
                project: descriptor.name.clone(),
            }
        })?;
        let runner = RecordingRunner::new();
        let orchestrator = dry_run_orchestrator(env, &runner, catalogue.defaults());
        print_plan(&orchestrator.checkout_plan(repository, &path));
        return Ok(());
    }

    let runner = ProcessRunner;
    let toolbox = Toolbox::discover(&runner)?;
    let orchestrator = Orchestrator::new(&runner, toolbox, catalogue.defaults(), &env.cwd)
        .interactive(env.interactive());
    let workspace = orchestrator.init_workspace(&descriptor, &path)?;

    println!(
        "{} Initialised {} workspace at {}",
        "✓".green(),
        descriptor.name.bold(),
        workspace.root().display()
    );
    Ok(())
}

/// Resolve a selection for a build directory and run the generator
///
/// Nothing is recorded unless the selection resolves and validates.
pub fn run_configure(
    env: &Environment,
    build_dir: &Path,
    args: &SelectionArgs,
    matches: Option<&ArgMatches>,
    assigned_only: bool,
    dry_run: bool,
) -> Result<()> {
    let build_dir = env.cwd.join(build_dir);
    let settings = args.ordered_settings(matches);

    let existing = if build_dir.join(BuildState::FILENAME).is_file() {
        Some(BuildDirectory::load(&build_dir)?)
    } else {
        None
    };
    let (workspace, selection) = match &existing {
        Some(build) => (
            build.workspace().clone(),
            amend_selection(build.selection().clone(), args, settings),
        ),
        None => {
            let workspace = match &env.context {
                Some(context) => context.workspace().clone(),
                None => {
                    return Err(s4_orchestrate::Error::NoWorkspace {
                        start: env.cwd.clone(),
                    }
                    .into());
                }
            };
            let selection = new_selection(args, settings, Some(workspace.project()))?;
            (workspace, selection)
        }
    };
    if selection.project != workspace.project() {
        return Err(s4_orchestrate::Error::ProjectMismatch {
            path: build_dir,
            expected: workspace.project().to_string(),
            found: selection.project,
        }
        .into());
    }

    let catalogue = env.catalogue_for(Some(workspace.root()))?;
    let policy = if assigned_only {
        EmitPolicy::AssignedOnly
    } else {
        EmitPolicy::AllMapped
    };
    let config = configure(&catalogue, &selection, policy)?;
    print_warnings(&config.warnings);

    if dry_run {
        let runner = RecordingRunner::new();
        let orchestrator = dry_run_orchestrator(env, &runner, catalogue.defaults());
        let plan = orchestrator.configure_plan(&workspace, &build_dir, &config)?;
        print_plan(&[plan]);
        return Ok(());
    }

    let runner = ProcessRunner;
    let toolbox = Toolbox::discover(&runner)?;
    let build = match existing {
        Some(mut build) => {
            build.reselect(selection)?;
            build
        }
        None => BuildDirectory::create(&workspace, &build_dir, selection)?,
    };
    Orchestrator::new(&runner, toolbox, catalogue.defaults(), &env.cwd)
        .interactive(env.interactive())
        .configure(&build, &config)?;

    println!(
        "{} Configured {} ({})",
        "✓".green(),
        build.root().display(),
        &config.fingerprint()[..12]
    );
    Ok(())
}

/// Build a configured build directory
pub fn run_build(
    env: &Environment,
    build_dir: Option<&Path>,
    targets: &[String],
    dry_run: bool,
) -> Result<()> {
    let build = build_directory(env, build_dir)?;
    let catalogue = env.catalogue_for(Some(build.workspace().root()))?;

    if dry_run {
        let runner = RecordingRunner::new();
        let orchestrator = dry_run_orchestrator(env, &runner, catalogue.defaults());
        print_plan(&[orchestrator.build_plan(&build, targets)?]);
        return Ok(());
    }

    let runner = ProcessRunner;
    let toolbox = Toolbox::discover(&runner)?;
    Orchestrator::new(&runner, toolbox, catalogue.defaults(), &env.cwd)
        .interactive(env.interactive())
        .build(&build, targets)?;
    Ok(())
}

/// Boot a built project on hardware through the machine queue
///
/// The recorded selection is resolved again, so the exit phrase and root
/// server follow the current catalogue.
pub fn run_hardware(
    env: &Environment,
    build_dir: Option<&Path>,
    system: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let build = build_directory(env, build_dir)?;
    let catalogue = env.catalogue_for(Some(build.workspace().root()))?;
    let config = configure(&catalogue, build.selection(), EmitPolicy::AllMapped)?;

    if dry_run {
        // Listing systems only reads the queue, so it runs even here
        let runner = ProcessRunner;
        let orchestrator = dry_run_orchestrator(env, &runner, catalogue.defaults());
        let systems = orchestrator.hardware_systems(&config.selection.platform, system)?;
        print_plan(&orchestrator.hardware_plan(&build, &config, &systems)?);
        return Ok(());
    }

    let runner = ProcessRunner;
    let toolbox = Toolbox {
        machine_queue: find_on_path(MACHINE_QUEUE),
        ..Toolbox::assumed()
    };
    let system = Orchestrator::new(&runner, toolbox, catalogue.defaults(), &env.cwd)
        .run_on_hardware(&build, &config, system)?;

    println!("{} {} ran on {}", "✓".green(), config.project.name.bold(), system);
    Ok(())
}

/// Pull the latest toolchain image
pub fn run_update_image(env: &Environment, dry_run: bool) -> Result<()> {
    let catalogue = env.catalogue()?;

    if dry_run {
        let runner = RecordingRunner::new();
        let orchestrator = dry_run_orchestrator(env, &runner, catalogue.defaults());
        print_plan(&[orchestrator.update_plan()]);
        return Ok(());
    }

    let runner = ProcessRunner;
    let toolbox = Toolbox::discover(&runner)?;
    Orchestrator::new(&runner, toolbox, catalogue.defaults(), &env.cwd).update_image()?;
    println!("{} Image is up to date", "✓".green());
    Ok(())
}

/// The named build directory, or the one enclosing the current directory
fn build_directory(env: &Environment, build_dir: Option<&Path>) -> Result<BuildDirectory> {
    match (build_dir, &env.context) {
        (Some(dir), _) => Ok(BuildDirectory::load(&env.cwd.join(dir))?),
        (None, Some(Context::Build(build))) => Ok(build.clone()),
        (None, _) => Err(s4_orchestrate::Error::NoBuildDirectory {
            start: env.cwd.clone(),
        }
        .into()),
    }
}

/// Orchestrator that only plans; tools are assumed to be on PATH
fn dry_run_orchestrator<'r>(
    env: &Environment,
    runner: &'r dyn CommandRunner,
    defaults: &s4_catalogue::Defaults,
) -> Orchestrator<'r> {
    Orchestrator::new(runner, Toolbox::assumed(), defaults, PathBuf::from(&env.cwd))
        .interactive(false)
}
