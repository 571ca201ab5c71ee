//! Deterministic turn-based combat engine.
//!
//! `combat-core` defines the canonical battle rules (scheduling, events,
//! effects, damage, action resolution) and exposes pure APIs over a single
//! [`WorldState`] value. Every engine operation takes the state by value and
//! returns the next one; content modules plug in as event handlers, effect
//! hooks, auras and summons. The runtime crate loads scenarios and drives
//! [`simulation::run`].
pub mod aura;
pub mod config;
pub mod damage;
pub mod digest;
pub mod effects;
pub mod error;
pub mod event;
pub mod resolver;
pub mod rng;
pub mod schedule;
pub mod simulation;
pub mod state;
pub mod stats;
pub mod summon;

pub use aura::{Aura, AuraTarget};
pub use config::BattleConfig;
pub use damage::{DamageKind, DamageModifiers};
#[cfg(feature = "serde")]
pub use digest::compute_log_digest;
pub use error::{ConfigError, EngineError, ErrorSeverity, Result};
pub use event::{Event, EventHandler, EventKind, HandlerRegistration};
pub use resolver::{DamageInstance, ShieldGrant};
pub use rng::{FixedRng, PcgRng, RngOracle, RollContext, RollSource};
pub use schedule::{ActionQueue, Advance, QueueEntry};
pub use state::{
    Abilities, Ability, AbilityEffect, AbilityEffectKind, ActionKind, ActionLog, ActorConfig,
    BattleResult, Effect, EffectCaps, EffectHooks, EffectId, EffectKind, EffectTarget, Faction,
    HandlerId, LogEntry, Outcome, PendingAction, TargetType, UltStrategy, Unit, UnitFlags, UnitId,
    WorldState,
};
pub use stats::{Element, ElementSet, Modifier, StatBlock, StatKey};
