//! Container engine invocations
//!
//! Every tool that needs the seL4 toolchain (cmake, ninja) runs inside the
//! project image. The host directory, the workspace and the build directory
//! are bind-mounted at fixed locations so paths in generated build files
//! stay valid between runs.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::runner::{CommandRunner, Invocation};
use crate::tools::Toolbox;

/// Mount point of the directory s4 was started from
pub const HOST_DIR: &str = "/host";
/// Mount point of the workspace root
pub const WORKSPACE_DIR: &str = "/workspace";
/// Mount point of the build directory
pub const BUILD_DIR: &str = "/build";

const HOSTNAME: &str = "s4";

/// Which engine answers to the `docker` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEngine {
    Docker,
    Podman,
}

impl ContainerEngine {
    /// Classify the output of `docker --version`
    pub fn from_version(output: &str) -> Self {
        if output.to_lowercase().contains("podman") {
            Self::Podman
        } else {
            Self::Docker
        }
    }

    pub fn detect(runner: &dyn CommandRunner, docker: &Path) -> Result<Self> {
        let output = runner.capture(&Invocation::new(docker).arg("--version"))?;
        Ok(Self::from_version(&output))
    }
}

impl fmt::Display for ContainerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Podman => write!(f, "podman"),
        }
    }
}

/// Builder for one `docker run` of the toolchain image
#[derive(Debug, Clone)]
pub struct ContainerRun {
    docker: PathBuf,
    engine: ContainerEngine,
    image: String,
    interactive: bool,
    user: Option<(u32, u32)>,
    /// Internal mount point to canonical host path
    mounts: BTreeMap<PathBuf, PathBuf>,
    workdir: PathBuf,
}

impl ContainerRun {
    pub fn new(toolbox: &Toolbox, image: impl Into<String>) -> Self {
        Self {
            docker: toolbox.docker.clone(),
            engine: toolbox.engine,
            image: image.into(),
            interactive: true,
            user: None,
            mounts: BTreeMap::new(),
            workdir: PathBuf::from(HOST_DIR),
        }
    }

    /// Allocate a terminal and keep stdin open (`-it`)
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// User the container runs as under docker; podman keeps the caller's ids
    pub fn user(mut self, ids: Option<(u32, u32)>) -> Self {
        self.user = ids;
        self
    }

    /// Bind-mount `external` at `internal`
    ///
    /// Existing paths are resolved fully; a path that does not exist yet is
    /// only made absolute so a plan can still be shown for it.
    pub fn mount(mut self, internal: impl Into<PathBuf>, external: &Path) -> Result<Self> {
        let external = match external.canonicalize() {
            Ok(path) => path,
            Err(_) => std::path::absolute(external).map_err(|e| Error::io(external, e))?,
        };
        self.mounts.insert(internal.into(), external);
        Ok(self)
    }

    pub fn host_dir(self, external: &Path) -> Result<Self> {
        self.mount(HOST_DIR, external)
    }

    pub fn workdir(mut self, internal: impl Into<PathBuf>) -> Self {
        self.workdir = internal.into();
        self
    }

    /// `docker run ... <image> <program> <args>`
    pub fn run<I, S>(&self, program: &str, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut invocation = Invocation::new(&self.docker).arg("run");
        if self.interactive {
            invocation = invocation.arg("-it");
        }
        invocation = invocation
            .args(["--rm", "--hostname", HOSTNAME])
            .args(["--volume", "/etc/localtime:/etc/localtime:ro"]);

        invocation = match (self.engine, self.user) {
            (ContainerEngine::Podman, _) => invocation.arg("--userns=keep-id"),
            (ContainerEngine::Docker, Some((uid, gid))) => {
                invocation.arg("--user").arg(format!("{}:{}", uid, gid))
            }
            (ContainerEngine::Docker, None) => invocation,
        };

        for (internal, external) in &self.mounts {
            invocation = invocation
                .arg("--volume")
                .arg(format!("{}:{}:z", external.display(), internal.display()));
        }

        invocation
            .arg("--workdir")
            .arg(self.workdir.display().to_string())
            .arg(self.image.as_str())
            .arg(program)
            .args(args)
    }
}

/// `docker pull <image>`
pub fn pull(toolbox: &Toolbox, image: &str) -> Invocation {
    Invocation::new(&toolbox.docker).arg("pull").arg(image)
}

/// Owner uid and gid of `path`
#[cfg(unix)]
pub fn owner_ids(path: &Path) -> Result<Option<(u32, u32)>> {
    use std::os::unix::fs::MetadataExt;

    let metadata = std::fs::metadata(path).map_err(|e| Error::io(path, e))?;
    Ok(Some((metadata.uid(), metadata.gid())))
}

#[cfg(not(unix))]
pub fn owner_ids(_path: &Path) -> Result<Option<(u32, u32)>> {
    Ok(None)
}
