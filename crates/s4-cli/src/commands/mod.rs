//! Command implementations for s4-cli

pub mod catalogue;
pub mod resolve;
pub mod workspace;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use colored::Colorize;

use s4_catalogue::{Catalogue, CatalogueLoader};
use s4_core::{CommandLineSetting, ResolveWarning, Selection};
use s4_orchestrate::{Context, Invocation, Workspace};

use crate::cli::SelectionArgs;
use crate::error::{CliError, Result};

pub use catalogue::{run_catalogue, run_flags};
pub use resolve::run_resolve;
pub use workspace::{run_build, run_configure, run_hardware, run_init, run_update_image};

/// Where the command runs and which catalogue documents it reads
#[derive(Debug)]
pub struct Environment {
    pub cwd: PathBuf,
    /// Workspace or build directory enclosing `cwd`
    pub context: Option<Context>,
    pub catalogues: Vec<PathBuf>,
    pub no_user_config: bool,
}

impl Environment {
    pub fn discover(catalogues: Vec<PathBuf>, no_user_config: bool) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let context = Context::discover(&cwd)?;
        Ok(Self {
            cwd,
            context,
            catalogues,
            no_user_config,
        })
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.context.as_ref().map(Context::workspace)
    }

    /// Catalogue sources in precedence order
    pub fn loader(&self, workspace: Option<&Path>) -> CatalogueLoader {
        let mut loader = CatalogueLoader::new().with_builtin();
        if !self.no_user_config {
            loader = loader.user_overlays();
        }
        if let Some(root) = workspace {
            loader = loader.overlays_in(root).easy_settings(root);
        }
        self.catalogues
            .iter()
            .fold(loader, |loader, path| loader.file(path))
    }

    /// Catalogue as seen from the enclosing workspace, if any
    pub fn catalogue(&self) -> Result<Catalogue> {
        self.catalogue_for(self.workspace().map(Workspace::root))
    }

    pub fn catalogue_for(&self, workspace: Option<&Path>) -> Result<Catalogue> {
        Ok(self.loader(workspace).load()?)
    }

    /// Whether the container should get a terminal
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
    }
}

/// Build a complete selection from options, falling back to `project`
pub fn new_selection(
    args: &SelectionArgs,
    settings: Vec<CommandLineSetting>,
    project: Option<&str>,
) -> Result<Selection> {
    let project = args
        .project
        .as_deref()
        .or(project)
        .ok_or(CliError::MissingOption {
            option: "project",
            purpose: "choose what to configure",
        })?;
    let platform = args.platform.clone().ok_or(CliError::MissingOption {
        option: "platform",
        purpose: "choose the hardware target",
    })?;
    let architecture = args.architecture.clone().ok_or(CliError::MissingOption {
        option: "arch",
        purpose: "choose the architecture",
    })?;

    let mut selection = Selection::new(project, platform, architecture);
    selection.settings = settings;
    Ok(selection)
}

/// Apply options on top of a recorded selection; new settings come last
pub fn amend_selection(
    mut selection: Selection,
    args: &SelectionArgs,
    settings: Vec<CommandLineSetting>,
) -> Selection {
    if let Some(project) = &args.project {
        selection.project = project.clone();
    }
    if let Some(platform) = &args.platform {
        selection.platform = platform.clone();
    }
    if let Some(architecture) = &args.architecture {
        selection.architecture = architecture.clone();
    }
    selection.settings.extend(settings);
    selection
}

pub(crate) fn print_warnings(warnings: &[ResolveWarning]) {
    for warning in warnings {
        eprintln!("{}: {}", "warning".yellow().bold(), warning);
    }
}

pub(crate) fn print_plan(invocations: &[Invocation]) {
    for invocation in invocations {
        println!("{} {}", "$".dimmed(), invocation);
    }
}
