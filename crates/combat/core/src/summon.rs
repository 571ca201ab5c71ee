//! Summons: units a combatant brings into the battle mid-fight.
//!
//! A summon joins its owner's side, sits right after its owner (and any
//! earlier summons of the same owner) in the roster and is scheduled like any
//! other unit. It never touches skill points and leaves the battle when its
//! owner is defeated.
//!
//! # Invariants
//!
//! - A summon always has `UnitFlags::SUMMON` and `summoner == Some(owner)`
//! - Adding or removing a summon leaves the action queue in sync

use tracing::debug;

use crate::aura;
use crate::effects;
use crate::error::{ConfigError, Result};
use crate::event::{self, Event};
use crate::schedule;
use crate::state::{Unit, UnitFlags, UnitId, WorldState};

/// Bring `summon` into the battle on `owner`'s side.
///
/// The summon gets a fresh id, its owner's faction and a full action value
/// for its speed. Returns the new id, or `None` when the owner is missing or
/// dead.
///
/// # Errors
///
/// Returns a configuration error when the summon's speed is not positive or
/// its abilities are malformed.
pub fn spawn_summon(
    mut state: WorldState,
    owner: UnitId,
    mut summon: Unit,
) -> Result<(WorldState, Option<UnitId>)> {
    let Some(faction) = state
        .unit(owner)
        .filter(|unit| unit.is_alive())
        .map(|unit| unit.faction)
    else {
        return Ok((state, None));
    };

    let id = state.next_unit_id();
    summon.id = id;
    summon.faction = faction;
    summon.summoner = Some(owner);
    summon.flags |= UnitFlags::SUMMON;
    summon.actor = None;
    summon.abilities.validate(id)?;
    if summon.speed() <= 0.0 {
        return Err(ConfigError::NonPositiveSpeed { unit: id }.into());
    }
    summon.action_value = schedule::action_value(summon.speed());

    let position = state
        .units
        .iter()
        .rposition(|unit| unit.id == owner || unit.is_summon_of(owner))
        .map_or(state.units.len(), |index| index + 1);
    state.units.insert(position, summon);
    debug!(
        target: "combat::simulation",
        unit = %id,
        owner = %owner,
        "summon joined"
    );

    state = aura::refresh(state);
    state = schedule::sync_queue(state);
    state = event::publish(state, &Event::UnitSummoned { owner, summon: id })?;
    Ok((state, Some(id)))
}

/// First living summon of `owner`.
pub fn active_summon(state: &WorldState, owner: UnitId) -> Option<&Unit> {
    state
        .units
        .iter()
        .find(|unit| unit.is_summon_of(owner) && unit.is_alive())
}

/// Every summon of `owner`, living or not, in roster order.
pub fn summons_of(state: &WorldState, owner: UnitId) -> Vec<UnitId> {
    state
        .units
        .iter()
        .filter(|unit| unit.is_summon_of(owner))
        .map(|unit| unit.id)
        .collect()
}

/// Take a summon out of the battle.
///
/// Its effects are detached (cascading to tied effects), its auras and
/// pending actions are dropped and it leaves the queue. Ids that are not
/// summons are ignored.
pub fn remove_summon(mut state: WorldState, summon: UnitId) -> Result<WorldState> {
    if !state.unit(summon).is_some_and(Unit::is_summon) {
        return Ok(state);
    }
    state = effects::detach_where(state, summon, |_| true)?;
    state = aura::remove_auras_by_source(state, summon);
    state.pending.retain(|action| action.actor != summon);
    state.units.retain(|unit| unit.id != summon);
    if state.current_turn_owner == Some(summon) {
        state.current_turn_owner = None;
    }
    debug!(target: "combat::simulation", unit = %summon, "summon removed");
    Ok(schedule::sync_queue(state))
}

/// Remove every summon of `owner`. Called when the owner is defeated.
pub fn remove_summons_of(mut state: WorldState, owner: UnitId) -> Result<WorldState> {
    for summon in summons_of(&state, owner) {
        state = remove_summon(state, summon)?;
    }
    Ok(state)
}
