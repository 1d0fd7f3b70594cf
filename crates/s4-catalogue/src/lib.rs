//! Catalogue of configurable flags, architectures, platforms and projects
//!
//! A catalogue is built from an ordered sequence of documents: the built-in
//! catalogue, user overlays and an optional workspace `easy-settings.cmake`.
//! Later documents add entities or replace same-named ones as a whole.
//!
//! ```text
//! CatalogueLoader ─ sources ─> Document* ─ load() ─> Catalogue (immutable)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use s4_catalogue::CatalogueLoader;
//!
//! let catalogue = CatalogueLoader::new()
//!     .with_builtin()
//!     .user_overlays()
//!     .load()?;
//! assert!(catalogue.project("sel4test").is_some());
//! # Ok::<(), s4_catalogue::Error>(())
//! ```

pub mod builtin;
pub mod catalogue;
pub mod document;
pub mod easy_settings;
pub mod error;
pub mod lint;
pub mod loader;
pub mod model;
pub mod value;

pub use catalogue::{Catalogue, DERIVED_FLAGS};
pub use document::{Document, DocumentFormat};
pub use error::{Error, LoadError, LoadErrorKind, Result};
pub use lint::{CatalogueWarning, WarnLevel};
pub use loader::{CatalogueLoader, CatalogueSource, OVERLAY_FILE_NAMES, load};
pub use model::{
    Architecture, Defaults, Entity, EntityKind, Flag, Overlay, Platform, Project, Repository,
    Variation,
};
pub use value::{FlagType, Requirement, RequirementSet, Value};
