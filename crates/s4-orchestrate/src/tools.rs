//! Locating the external programs s4 drives

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::container::ContainerEngine;
use crate::error::{Error, Result};
use crate::runner::{CommandRunner, Invocation};

pub const REPO: &str = "repo";
pub const DOCKER: &str = "docker";
pub const MACHINE_QUEUE: &str = "mq.sh";

/// First entry of a `PATH`-style list that contains `tool`
pub fn find_in(tool: impl AsRef<Path>, search_path: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .map(|dir| dir.join(tool.as_ref()))
        .find(|candidate| candidate.is_file())
}

/// Look `tool` up on the current `PATH`
pub fn find_on_path(tool: impl AsRef<Path>) -> Option<PathBuf> {
    let search_path = std::env::var_os("PATH")?;
    find_in(tool, &search_path)
}

/// Paths of the checkout tool, the container engine and the machine queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolbox {
    pub repo: PathBuf,
    pub docker: PathBuf,
    pub engine: ContainerEngine,
    /// Only needed to run images on hardware
    pub machine_queue: Option<PathBuf>,
}

impl Toolbox {
    /// Find both tools on `PATH` and ask the engine what it really is
    pub fn discover(runner: &dyn CommandRunner) -> Result<Self> {
        let repo = find_on_path(REPO).ok_or(Error::ToolNotFound {
            tool: REPO.to_string(),
            hint: "install the repo tool from https://gerrit.googlesource.com/git-repo",
        })?;
        let docker = find_on_path(DOCKER).ok_or(Error::ToolNotFound {
            tool: DOCKER.to_string(),
            hint: "docker or podman-docker must be installed",
        })?;
        let engine = ContainerEngine::detect(runner, &docker)?;
        let machine_queue = find_on_path(MACHINE_QUEUE);
        tracing::debug!(
            repo = %repo.display(),
            docker = %docker.display(),
            %engine,
            machine_queue = machine_queue.is_some(),
            "Found tools"
        );
        Ok(Self {
            repo,
            docker,
            engine,
            machine_queue,
        })
    }

    /// Bare tool names, for printing a plan without touching the system
    pub fn assumed() -> Self {
        Self {
            repo: PathBuf::from(REPO),
            docker: PathBuf::from(DOCKER),
            engine: ContainerEngine::Docker,
            machine_queue: Some(PathBuf::from(MACHINE_QUEUE)),
        }
    }

    pub fn repo(&self) -> Invocation {
        Invocation::new(&self.repo)
    }

    pub fn machine_queue(&self) -> Result<Invocation> {
        self.machine_queue
            .as_ref()
            .map(Invocation::new)
            .ok_or(Error::ToolNotFound {
                tool: MACHINE_QUEUE.to_string(),
                hint: "the machine queue client is needed to run images on hardware",
            })
    }
}
