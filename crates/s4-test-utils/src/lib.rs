//! Shared test utilities for the s4 workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not each
//! grow their own catalogue snippets. It is a dev-dependency only.
//!
//! # Modules
//!
//! - [`fixtures`] - catalogue documents used across test suites
//! - [`workspace`] - [`TestWorkspace`] temporary workspace builder

pub mod fixtures;
pub mod workspace;

pub use workspace::TestWorkspace;
