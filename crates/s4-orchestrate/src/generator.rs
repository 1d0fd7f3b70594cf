//! Build-system generator (`cmake`) and build tool (`ninja`) invocations
//!
//! Both run in the container with the workspace at `/workspace` and the
//! build directory at `/build`.

use std::path::{Path, PathBuf};

use crate::container::{BUILD_DIR, ContainerRun, WORKSPACE_DIR};
use crate::runner::Invocation;
use crate::workspace::CACHE_DIR;

/// Initial-cache script expected in every project source directory
pub const SETTINGS_FILE: &str = "settings.cmake";

fn in_workspace(relative: &Path) -> PathBuf {
    Path::new(WORKSPACE_DIR).join(relative)
}

/// First configuration of an empty build directory
///
/// `source_directory` is relative to the workspace root.
pub fn cmake_generate(
    container: &ContainerRun,
    source_directory: &Path,
    definitions: &[String],
) -> Invocation {
    let source = in_workspace(source_directory);
    let settings = source.join(SETTINGS_FILE);

    let mut args = vec![
        "-G".to_string(),
        "Ninja".to_string(),
        format!("-DSEL4_CACHE_DIR={}/{}", WORKSPACE_DIR, CACHE_DIR),
        "-B".to_string(),
        BUILD_DIR.to_string(),
        "-S".to_string(),
        source.display().to_string(),
        "-C".to_string(),
        settings.display().to_string(),
    ];
    args.extend(definitions.iter().cloned());

    container.clone().workdir(BUILD_DIR).run("cmake", args)
}

/// Reconfiguration of an already generated build directory
pub fn cmake_reconfigure(container: &ContainerRun, definitions: &[String]) -> Invocation {
    let args = definitions
        .iter()
        .cloned()
        .chain(std::iter::once(BUILD_DIR.to_string()));
    container.clone().workdir(BUILD_DIR).run("cmake", args)
}

pub fn ninja(container: &ContainerRun, targets: &[String]) -> Invocation {
    container
        .clone()
        .workdir(BUILD_DIR)
        .run("ninja", targets.iter().cloned())
}
