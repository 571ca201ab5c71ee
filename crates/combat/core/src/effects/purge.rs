//! Cleanse and dispel.

use tracing::debug;

use crate::error::Result;
use crate::state::{Effect, EffectCaps, EffectCategory, EffectId, UnitId, WorldState};

use super::detach;

/// Remove up to `count` cleansable debuffs from `target`, latest first.
pub fn cleanse(state: WorldState, target: UnitId, count: usize) -> Result<WorldState> {
    let ids = latest_matching(&state, target, count, |effect| {
        effect.category == EffectCategory::Debuff && effect.caps.contains(EffectCaps::CLEANSABLE)
    });
    debug!(target: "combat::effects", unit = %target, removed = ids.len(), "cleanse");
    remove_all(state, target, ids)
}

/// Remove up to `count` dispellable buffs from `target`, latest first.
/// Shields and tied effects are never dispelled.
pub fn dispel(state: WorldState, target: UnitId, count: usize) -> Result<WorldState> {
    let ids = latest_matching(&state, target, count, |effect| {
        effect.category == EffectCategory::Buff
            && effect.caps.contains(EffectCaps::DISPELLABLE)
            && !effect.is_shield()
            && !effect.is_tied()
    });
    debug!(target: "combat::effects", unit = %target, removed = ids.len(), "dispel");
    remove_all(state, target, ids)
}

fn latest_matching(
    state: &WorldState,
    target: UnitId,
    count: usize,
    predicate: impl Fn(&Effect) -> bool,
) -> Vec<EffectId> {
    state
        .unit(target)
        .map(|unit| {
            unit.effects
                .iter()
                .rev()
                .filter(|effect| predicate(effect))
                .take(count)
                .map(|effect| effect.id.clone())
                .collect()
        })
        .unwrap_or_default()
}

fn remove_all(mut state: WorldState, target: UnitId, ids: Vec<EffectId>) -> Result<WorldState> {
    for id in ids {
        state = detach(state, target, &id)?;
    }
    Ok(state)
}
