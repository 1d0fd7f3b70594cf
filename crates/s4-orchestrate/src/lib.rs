//! External orchestration for s4
//!
//! Turns a [`ResolvedConfiguration`](s4_core::ResolvedConfiguration) into
//! runs of the tools that do the real work:
//!
//! - **repo**: checks a project manifest out into a new workspace
//! - **docker/podman**: hosts the toolchain image
//! - **cmake/ninja**: generate and build inside the container
//! - **mq.sh**: boots the built images on lab hardware
//!
//! All of them are described as [`Invocation`]s first and executed through a
//! [`CommandRunner`], so a plan can be printed or inspected without running
//! anything.

pub mod checkout;
pub mod container;
pub mod error;
pub mod generator;
pub mod images;
pub mod machine_queue;
pub mod orchestrator;
pub mod runner;
pub mod tools;
pub mod workspace;

pub use container::{ContainerEngine, ContainerRun};
pub use error::{Error, Result};
pub use images::BootImages;
pub use machine_queue::HardwareSystem;
pub use orchestrator::Orchestrator;
pub use runner::{CommandRunner, Invocation, ProcessRunner, RecordingRunner};
pub use tools::{Toolbox, find_on_path};
pub use workspace::{BuildDirectory, BuildState, Context, Workspace, WorkspaceState};
