//! Duration ticking at turn boundaries.

use crate::error::Result;
use crate::state::{DurationPolicy, EffectId, UnitId, WorldState};

use super::detach;

/// Decrement one effect and run its tick callback. Returns whether it expired.
fn decrement(mut state: WorldState, owner: UnitId, id: &EffectId) -> Result<(WorldState, bool)> {
    let Some(effect) = state
        .unit_mut(owner)
        .and_then(|unit| unit.effect_mut(id))
    else {
        return Ok((state, false));
    };
    effect.remaining = effect.remaining.saturating_sub(1);
    let snapshot = effect.clone();
    if let Some(hooks) = snapshot.hooks.clone() {
        state = hooks.on_tick(state, owner, &snapshot)?;
    }
    Ok((state, snapshot.remaining == 0))
}

/// Tick the turn-start effects of the acting unit.
///
/// Crowd-control effects are left to the crowd-control path, which has to see
/// them before they count down.
pub fn tick_turn_start(mut state: WorldState, unit: UnitId) -> Result<WorldState> {
    let ids: Vec<EffectId> = state
        .unit(unit)
        .map(|owner| {
            owner
                .effects
                .iter()
                .filter(|effect| effect.duration == DurationPolicy::TurnStart)
                .filter(|effect| !effect.is_crowd_control())
                .map(|effect| effect.id.clone())
                .collect()
        })
        .unwrap_or_default();

    for id in ids {
        state = count_down(state, unit, &id)?.0;
    }
    Ok(state)
}

/// Decrement one effect outside the regular ticks and detach it on expiry.
/// Returns whether it expired.
pub fn count_down(state: WorldState, owner: UnitId, id: &EffectId) -> Result<(WorldState, bool)> {
    let (state, expired) = decrement(state, owner, id)?;
    if expired {
        Ok((detach(state, owner, id)?, true))
    } else {
        Ok((state, false))
    }
}

/// Tick the turn-end effects of the acting unit.
///
/// An effect flagged `skip_first_turn_decrement` that was applied during its
/// owner's own turn is not decremented at the end of that turn.
pub fn tick_turn_end(mut state: WorldState, unit: UnitId) -> Result<WorldState> {
    let ids: Vec<EffectId> = state
        .unit(unit)
        .map(|owner| {
            owner
                .effects
                .iter()
                .filter(|effect| effect.duration == DurationPolicy::TurnEnd)
                .map(|effect| effect.id.clone())
                .collect()
        })
        .unwrap_or_default();

    for id in ids {
        let skip = state
            .unit_mut(unit)
            .and_then(|owner| owner.effect_mut(&id))
            .map(|effect| {
                let skip = effect.skip_first_turn_decrement
                    && effect.applied_during_turn_of == Some(unit);
                if skip {
                    effect.applied_during_turn_of = None;
                }
                skip
            })
            .unwrap_or(true);
        if skip {
            continue;
        }
        state = count_down(state, unit, &id)?.0;
    }
    Ok(state)
}
