//! Project checkout with the `repo` tool

use std::path::Path;

use s4_catalogue::{Defaults, Repository};

use crate::runner::Invocation;
use crate::tools::Toolbox;

/// `repo init` for the project manifest, run in the workspace root
pub fn repo_init(
    toolbox: &Toolbox,
    defaults: &Defaults,
    repository: &Repository,
    workspace_root: &Path,
) -> Invocation {
    let mut invocation = toolbox
        .repo()
        .arg("init")
        .arg("--manifest-url")
        .arg(defaults.git_repo_url(repository));

    if let Some(branch) = defaults.repo_branch() {
        invocation = invocation.arg("--manifest-branch").arg(branch);
    }
    if let Some(manifest) = defaults.repo_manifest() {
        invocation = invocation.arg("--manifest-name").arg(manifest);
    }

    invocation.current_dir(workspace_root)
}

/// `repo sync`, run in the workspace root
pub fn repo_sync(toolbox: &Toolbox, workspace_root: &Path) -> Invocation {
    toolbox.repo().arg("sync").current_dir(workspace_root)
}
