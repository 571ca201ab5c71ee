//! Action resolver.
//!
//! Turns an ability use into state changes: costs, hits, toughness, weakness
//! break, healing, shields, energy, ability effects and the log entry.
//!
//! The primitives ([`apply_damage`], [`apply_shield`], [`reduce_toughness`],
//! ...) are public so content-module handlers deal damage and grant shields
//! through the same code path as abilities.

mod apply;
mod pipeline;
mod targeting;

pub use apply::{
    DamageInstance, ShieldGrant, add_energy, apply_damage, apply_healing, apply_shield,
    queue_action, reduce_toughness,
};
pub use pipeline::{drain_pending, resolve_action};
pub use targeting::{Hit, Hits, default_target, generate_hits, pick_weighted_target, resolve_targets};
