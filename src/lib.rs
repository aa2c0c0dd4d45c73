//! Verity: test discovery and execution with a deep structural comparison
//! engine for assertion messages.
//!
//! - [`object`] declares runnable modules, functions and classes.
//! - [`runtime`] discovers scenarios in them, runs them and aggregates results.
//! - [`compare`] explains, path by path, why two values differ.
//! - [`reporter`] observes a run; [`loader`] finds modules on disk.

pub mod cli;
pub mod compare;
pub mod errors;
pub mod loader;
pub mod location;
pub mod object;
pub mod reporter;
pub mod runtime;
pub mod value;

pub use compare::{assert_deep_equal, compare, Explanation};
pub use errors::{UnitError, UnitResult, VerityError};
pub use value::Value;
