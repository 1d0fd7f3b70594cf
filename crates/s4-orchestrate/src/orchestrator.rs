//! Handing a resolved configuration to the external tools

use std::path::{Path, PathBuf};

use s4_catalogue::{Defaults, Repository};
use s4_core::{PlatformChoice, ProjectDescriptor, ResolvedConfiguration};

use crate::checkout::{repo_init, repo_sync};
use crate::container::{self, BUILD_DIR, ContainerRun, WORKSPACE_DIR};
use crate::error::{Error, Result};
use crate::generator::{cmake_generate, cmake_reconfigure, ninja};
use crate::images::BootImages;
use crate::machine_queue;
use crate::runner::{CommandRunner, Invocation};
use crate::tools::Toolbox;
use crate::workspace::{BuildDirectory, Workspace};

/// Drives checkout, configuration and builds through a [`CommandRunner`]
pub struct Orchestrator<'r> {
    runner: &'r dyn CommandRunner,
    toolbox: Toolbox,
    defaults: Defaults,
    host_dir: PathBuf,
    interactive: bool,
}

impl<'r> Orchestrator<'r> {
    /// `host_dir` is mounted at `/host`; usually the current directory
    pub fn new(
        runner: &'r dyn CommandRunner,
        toolbox: Toolbox,
        defaults: &Defaults,
        host_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            toolbox,
            defaults: defaults.clone(),
            host_dir: host_dir.into(),
            interactive: true,
        }
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    /// `repo init` then `repo sync` in `workspace_root`
    pub fn checkout_plan(&self, repository: &Repository, workspace_root: &Path) -> Vec<Invocation> {
        vec![
            repo_init(&self.toolbox, &self.defaults, repository, workspace_root),
            repo_sync(&self.toolbox, workspace_root),
        ]
    }

    /// Create a workspace for `project` and check it out
    pub fn init_workspace(&self, project: &ProjectDescriptor, path: &Path) -> Result<Workspace> {
        let repository = project
            .repository
            .as_ref()
            .ok_or_else(|| Error::NoRepository {
                project: project.name.clone(),
            })?;

        let workspace = Workspace::create(&project.name, path)?;
        tracing::info!(project = %project.name, %repository, "Checking out project");
        for invocation in self.checkout_plan(repository, workspace.root()) {
            self.runner.run(&invocation)?;
        }
        Ok(workspace)
    }

    /// Container with the host, workspace and build directories mounted
    pub fn container(&self, workspace: &Workspace, build_root: Option<&Path>) -> Result<ContainerRun> {
        let mut run = ContainerRun::new(&self.toolbox, self.defaults.docker_image())
            .interactive(self.interactive)
            .user(container::owner_ids(workspace.root())?)
            .host_dir(&self.host_dir)?
            .mount(WORKSPACE_DIR, workspace.root())?;
        if let Some(build_root) = build_root {
            run = run.mount(BUILD_DIR, build_root)?;
        }
        Ok(run)
    }

    /// The `cmake` run that configures `build_root` for `config`
    ///
    /// A build directory the generator has not seen yet is generated from
    /// the project source; an existing one is only reconfigured.
    pub fn configure_plan(
        &self,
        workspace: &Workspace,
        build_root: &Path,
        config: &ResolvedConfiguration,
    ) -> Result<Invocation> {
        let container = self.container(workspace, Some(build_root))?;
        let definitions = config.variables.definitions();

        if build_root.join("CMakeCache.txt").is_file() {
            Ok(cmake_reconfigure(&container, &definitions))
        } else {
            let source = workspace.source_directory(&config.project)?;
            Ok(cmake_generate(&container, &source, &definitions))
        }
    }

    pub fn configure(&self, build: &BuildDirectory, config: &ResolvedConfiguration) -> Result<()> {
        let invocation = self.configure_plan(build.workspace(), build.root(), config)?;
        tracing::info!(
            build = %build.root().display(),
            fingerprint = %config.fingerprint(),
            "Configuring build directory"
        );
        self.runner.run(&invocation)
    }

    pub fn build_plan(&self, build: &BuildDirectory, targets: &[String]) -> Result<Invocation> {
        let container = self.container(build.workspace(), Some(build.root()))?;
        Ok(ninja(&container, targets))
    }

    pub fn build(&self, build: &BuildDirectory, targets: &[String]) -> Result<()> {
        let invocation = self.build_plan(build, targets)?;
        tracing::info!(build = %build.root().display(), "Building");
        self.runner.run(&invocation)
    }

    /// Systems to try for `target`, asking the machine queue unless one is given
    pub fn hardware_systems(
        &self,
        target: &PlatformChoice,
        system: Option<&str>,
    ) -> Result<Vec<String>> {
        if let Some(system) = system {
            return Ok(vec![system.to_string()]);
        }

        let systems = self
            .runner
            .capture(&machine_queue::systems_query(&self.toolbox)?)?;
        let pools = self
            .runner
            .capture(&machine_queue::pools_query(&self.toolbox)?)?;
        let matched = machine_queue::matching_systems(
            &machine_queue::parse_systems(&systems),
            &machine_queue::parse_pools(&pools),
            target,
        );
        tracing::debug!(%target, systems = ?matched, "Matched hardware systems");

        if matched.is_empty() {
            return Err(Error::NoMatchingSystem {
                target: target.to_string(),
            });
        }
        Ok(matched)
    }

    /// One `mq.sh run` per system, each booting the built images
    pub fn hardware_plan(
        &self,
        build: &BuildDirectory,
        config: &ResolvedConfiguration,
        systems: &[String],
    ) -> Result<Vec<Invocation>> {
        let images = BootImages::new(config)
            .files(build.root(), config.project.root_server.as_deref())?;
        systems
            .iter()
            .map(|system| {
                machine_queue::run(
                    &self.toolbox,
                    system,
                    &config.project.exit_phrase,
                    &images,
                    build.root(),
                )
            })
            .collect()
    }

    /// Boot the build on hardware, trying systems in order until one succeeds
    ///
    /// Returns the system that printed the exit phrase.
    pub fn run_on_hardware(
        &self,
        build: &BuildDirectory,
        config: &ResolvedConfiguration,
        system: Option<&str>,
    ) -> Result<String> {
        let systems = self.hardware_systems(&config.selection.platform, system)?;
        let plan = self.hardware_plan(build, config, &systems)?;

        for (system, invocation) in systems.iter().zip(&plan) {
            tracing::info!(%system, "Running on hardware");
            match self.runner.run(invocation) {
                Ok(()) => return Ok(system.clone()),
                Err(Error::ToolFailed { code, .. }) => {
                    tracing::warn!(%system, ?code, "Hardware run failed, trying the next system");
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::NoSystemSucceeded { tried: systems })
    }

    pub fn update_plan(&self) -> Invocation {
        container::pull(&self.toolbox, self.defaults.docker_image())
    }

    /// Pull the latest toolchain image
    pub fn update_image(&self) -> Result<()> {
        tracing::info!(image = self.defaults.docker_image(), "Updating image");
        self.runner.run(&self.update_plan())
    }
}
