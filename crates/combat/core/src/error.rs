//! Common error infrastructure for combat-core.
//!
//! Three kinds of failure exist in the engine:
//!
//! - **Lookup failures** (a stale unit or effect id) are not errors at all. Every
//!   primitive treats them as a no-op and returns the state unchanged.
//! - **Invariant violations** (dangling ties, impossible stack counts, queue
//!   entries for unknown units) are defects and surface as [`EngineError`].
//! - **Configuration errors** are caught before the battle starts and surface as
//!   [`ConfigError`].

use thiserror::Error;

use crate::state::{EffectId, HandlerId, UnitId};

/// Result alias used across the engine.
pub type Result<T> = core::result::Result<T, EngineError>;

/// Severity level of an error, used for categorization by hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Invalid input supplied before the simulation started.
    Validation,

    /// Unexpected state inconsistency; indicates a bug in the engine or a
    /// content module.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Failures raised while the battle is running.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("effect {effect} on {unit} is tied to missing parent {parent}")]
    DanglingTie {
        unit: UnitId,
        effect: EffectId,
        parent: EffectId,
    },

    #[error("effect {effect} has invalid stack count {stacks} (max {max_stacks})")]
    InvalidStackCount {
        effect: EffectId,
        stacks: u32,
        max_stacks: u32,
    },

    #[error("action queue references unknown unit {0}")]
    UnknownQueueEntry(UnitId),

    #[error("handler {handler} failed: {message}")]
    Handler { handler: HandlerId, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Convenience constructor for content-module handlers.
    pub fn handler(handler: &HandlerId, message: impl Into<String>) -> Self {
        Self::Handler {
            handler: handler.clone(),
            message: message.into(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config(_) => ErrorSeverity::Validation,
            Self::DanglingTie { .. }
            | Self::InvalidStackCount { .. }
            | Self::UnknownQueueEntry(_)
            | Self::Handler { .. } => ErrorSeverity::Internal,
        }
    }
}

/// Setup-time validation failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("party must contain at least one character")]
    EmptyParty,

    #[error("enemy roster must contain at least one enemy")]
    EmptyEnemies,

    #[error("battle must last at least one round")]
    ZeroRounds,

    #[error("duplicate unit id {0}")]
    DuplicateUnit(UnitId),

    #[error("unit {unit} has non-positive speed")]
    NonPositiveSpeed { unit: UnitId },

    #[error("unit {unit} has an empty rotation")]
    EmptyRotation { unit: UnitId },

    #[error("unit {unit} has invalid rotation step '{step}' (expected 's' or 'b')")]
    InvalidRotationStep { unit: UnitId, step: char },

    #[error("unit {unit} references unknown content '{content}'")]
    UnknownContent { unit: UnitId, content: String },

    #[error("ability '{ability}' on {unit} declares zero max stacks for an effect")]
    InvalidMaxStacks { unit: UnitId, ability: &'static str },

    #[error("ability '{ability}' on {unit} generates more than {max} hits")]
    TooManyHits {
        unit: UnitId,
        ability: &'static str,
        max: usize,
    },
}
