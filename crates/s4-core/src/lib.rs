//! Resolution engine for s4
//!
//! This crate turns a [`Selection`] into build variables against an
//! immutable [`Catalogue`](s4_catalogue::Catalogue):
//!
//! - **Compositor**: applies architecture, platform, variation, project and
//!   command-line overlays onto a flat [`FlagTable`]
//! - **Validator**: checks every non-default flag against its requirement sets
//! - **Emitter**: maps flags to typed build-system variables in catalogue order
//!
//! ```text
//! Selection ─ resolve() ─> FlagTable ─ validate() ─> [Violation] ─ emit ─> BuildVariables
//! ```
//!
//! # Example
//!
//! ```ignore
//! use s4_catalogue::CatalogueLoader;
//! use s4_core::{EmitPolicy, PlatformChoice, Selection, configure};
//!
//! let catalogue = CatalogueLoader::new().with_builtin().load()?;
//! let selection = Selection::new("sel4test", PlatformChoice::platform("tx2"), "aarch64")
//!     .enable("release");
//! let config = configure(&catalogue, &selection, EmitPolicy::AllMapped)?;
//! for definition in config.variables.definitions() {
//!     println!("{definition}");
//! }
//! ```

pub mod compositor;
pub mod emitter;
pub mod error;
pub mod pipeline;
pub mod selection;
pub mod table;
pub mod validator;

pub use compositor::{Resolution, ResolveWarning, resolve};
pub use emitter::{BuildVariable, BuildVariables, CacheType, EmitPolicy, Rendering};
pub use error::{Error, Result, SelectionError, UnknownRendering};
pub use pipeline::{ProjectDescriptor, ResolvedConfiguration, configure};
pub use selection::{CommandLineSetting, PlatformChoice, Selection};
pub use table::{Assignment, FlagTable, Layer};
pub use validator::{UnmetConstraint, Violation, validate};
