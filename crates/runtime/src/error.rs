//! Error type surfaced by the runtime.
//!
//! Wraps engine failures, setup validation and scenario I/O so the host can
//! bubble them up with consistent context.
use std::path::PathBuf;

use thiserror::Error;

use combat_core::{ConfigError, EngineError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime requires a scenario or an initial state before building")]
    MissingScenario,

    #[error("failed to read scenario file {path}")]
    ScenarioIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario {path}")]
    ScenarioParse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to encode battle report")]
    Report(#[source] serde_json::Error),
}
