//! Runtime orchestration for the combat engine.
//!
//! This crate loads battle scenarios, resolves the content modules each unit
//! carries, runs the battle through `combat-core` and summarises the result.
//!
//! Modules are organized by responsibility:
//! - [`scenario`] parses RON scenario files into the initial world state
//! - [`content`] keeps the content-module factories keyed by id
//! - [`runtime`] hosts the builder, the runner and the battle report
pub mod content;
pub mod error;
pub mod runtime;
pub mod scenario;

pub use content::{ContentFactory, ContentRegistry};
pub use error::{Result, RuntimeError};
pub use runtime::{BattleReport, Runtime, RuntimeBuilder, RuntimeConfig, UnitReport};
pub use scenario::{Scenario, UnitSpec};
