//! Action-value turn scheduling.
//!
//! Every living unit carries an action value: the elapsed time until its next
//! turn. The unit with the lowest value acts next. Time advances by the
//! lowest value, which brings that unit to zero; after acting, its value is
//! reset to `BASE_ACTION_VALUE / speed`.
//!
//! Units store the authoritative value; the [`ActionQueue`] holds the sorted
//! `(unit, action value)` view and is rebuilt by [`sync_queue`].

use tracing::debug;

use crate::config::BattleConfig;
use crate::error::{EngineError, Result};
use crate::state::{UnitId, WorldState};

/// Ticks until the next turn of a unit with speed `speed`.
pub fn action_value(speed: f64) -> f64 {
    if speed <= 0.0 {
        BattleConfig::BASE_ACTION_VALUE
    } else {
        BattleConfig::BASE_ACTION_VALUE / speed
    }
}

/// A scheduling token.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueEntry {
    pub unit: UnitId,
    pub action_value: f64,
}

/// Turn order, sorted ascending by action value with no duplicate units.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionQueue {
    entries: Vec<QueueEntry>,
}

impl ActionQueue {
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn first(&self) -> Option<&QueueEntry> {
        self.entries.first()
    }

    pub fn position(&self, unit: UnitId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.unit == unit)
    }

    pub fn order(&self) -> Vec<UnitId> {
        self.entries.iter().map(|entry| entry.unit).collect()
    }
}

/// Change to a unit's remaining action value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Advance {
    /// Fraction of a full turn (`0.5` = half a turn).
    Percent(f64),
    /// Raw action value.
    Fixed(f64),
}

impl Advance {
    fn amount(self, speed: f64) -> f64 {
        match self {
            Advance::Percent(fraction) => fraction * action_value(speed),
            Advance::Fixed(value) => value,
        }
    }
}

/// Rebuild the queue from living units.
///
/// Ties keep their prior queue position; units new to the queue go after
/// existing ones in roster order.
pub fn sync_queue(mut state: WorldState) -> WorldState {
    let prior = state.queue.order();
    let mut ranked: Vec<(usize, QueueEntry)> = state
        .units
        .iter()
        .enumerate()
        .filter(|(_, unit)| unit.is_alive())
        .map(|(roster_index, unit)| {
            let rank = prior
                .iter()
                .position(|id| *id == unit.id)
                .unwrap_or(prior.len() + roster_index);
            (
                rank,
                QueueEntry {
                    unit: unit.id,
                    action_value: unit.action_value,
                },
            )
        })
        .collect();
    ranked.sort_by(|(rank_a, a), (rank_b, b)| {
        a.action_value
            .total_cmp(&b.action_value)
            .then(rank_a.cmp(rank_b))
    });
    state.queue.entries = ranked.into_iter().map(|(_, entry)| entry).collect();
    state
}

/// Unit at the head of the queue.
pub fn next_actor(state: &WorldState) -> Result<Option<UnitId>> {
    match state.queue.first() {
        Some(entry) if state.unit(entry.unit).is_none() => {
            Err(EngineError::UnknownQueueEntry(entry.unit))
        }
        Some(entry) => Ok(Some(entry.unit)),
        None => Ok(None),
    }
}

/// Let `amount` of time pass for every queued unit.
pub fn advance_timeline(mut state: WorldState, amount: f64) -> WorldState {
    if amount <= 0.0 {
        return state;
    }
    let queued = state.queue.order();
    for id in queued {
        if let Some(unit) = state.unit_mut(id) {
            unit.action_value = (unit.action_value - amount).max(0.0);
            unit.action_point += amount * unit.speed();
        }
    }
    for entry in &mut state.queue.entries {
        entry.action_value = (entry.action_value - amount).max(0.0);
    }
    state.time += amount;
    state
}

/// Start a fresh turn for `unit`: full action value, empty gauge.
pub fn reset_for_turn(mut state: WorldState, unit: UnitId) -> WorldState {
    if let Some(actor) = state.unit_mut(unit) {
        actor.action_value = action_value(actor.speed());
        actor.action_point = 0.0;
    }
    sync_queue(state)
}

fn set_action_value(mut state: WorldState, unit: UnitId, value: f64) -> WorldState {
    let Some(target) = state.unit_mut(unit) else {
        return state;
    };
    target.action_value = value.max(0.0);
    target.action_point = BattleConfig::BASE_ACTION_VALUE - target.action_value * target.speed();
    debug!(
        target: "combat::schedule",
        unit = %unit,
        action_value = target.action_value,
        "action value changed"
    );
    sync_queue(state)
}

/// Pull a unit's next turn closer.
pub fn advance_action(state: WorldState, unit: UnitId, advance: Advance) -> WorldState {
    let Some(target) = state.unit(unit) else {
        return state;
    };
    let value = target.action_value - advance.amount(target.speed());
    set_action_value(state, unit, value)
}

/// Push a unit's next turn back.
pub fn delay_action(state: WorldState, unit: UnitId, delay: Advance) -> WorldState {
    let Some(target) = state.unit(unit) else {
        return state;
    };
    let value = target.action_value + delay.amount(target.speed());
    set_action_value(state, unit, value)
}

/// Delay expressed on the action gauge, as used by weakness break.
///
/// # Formula
/// ```text
/// action_point -= 10000 × delay
/// action_value  = max(0, (10000 − action_point) / speed)
/// ```
pub fn delay_gauge(mut state: WorldState, unit: UnitId, delay: f64) -> WorldState {
    let Some(target) = state.unit_mut(unit) else {
        return state;
    };
    target.action_point -= BattleConfig::BASE_ACTION_VALUE * delay;
    let speed = target.speed();
    target.action_value = if speed > 0.0 {
        ((BattleConfig::BASE_ACTION_VALUE - target.action_point) / speed).max(0.0)
    } else {
        BattleConfig::BASE_ACTION_VALUE
    };
    debug!(
        target: "combat::schedule",
        unit = %unit,
        delay,
        action_value = target.action_value,
        "gauge delayed"
    );
    sync_queue(state)
}

/// Rescale the remaining action value after a speed change.
///
/// # Formula
/// ```text
/// new_value = old_value × old_speed / new_speed
/// ```
pub fn rescale_for_speed(mut state: WorldState, unit: UnitId, old_speed: f64) -> WorldState {
    let Some(target) = state.unit_mut(unit) else {
        return state;
    };
    let new_speed = target.speed();
    if old_speed <= 0.0 || new_speed <= 0.0 || old_speed == new_speed {
        return state;
    }
    target.action_value *= old_speed / new_speed;
    debug!(
        target: "combat::schedule",
        unit = %unit,
        old_speed,
        new_speed,
        action_value = target.action_value,
        "action value rescaled"
    );
    sync_queue(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Faction, Unit};
    use crate::stats::{Element, StatBlock, StatKey};

    fn create_test_state(speeds: &[f64]) -> WorldState {
        let mut state = WorldState::new(BattleConfig::default());
        for (index, speed) in speeds.iter().enumerate() {
            let unit = Unit::new(
                UnitId(index as u32),
                format!("unit-{index}"),
                Faction::Ally,
                Element::Ice,
                80,
                StatBlock::zeroed()
                    .with(StatKey::Hp, 100.0)
                    .with(StatKey::Spd, *speed),
            );
            state.add_unit(unit).expect("valid unit");
        }
        sync_queue(state)
    }

    fn av(state: &WorldState, unit: u32) -> f64 {
        state
            .unit(UnitId(unit))
            .map(|unit| unit.action_value)
            .unwrap_or(f64::NAN)
    }

    #[test]
    fn faster_units_act_first() {
        let state = create_test_state(&[100.0, 125.0, 80.0]);
        assert_eq!(state.queue.order(), vec![UnitId(1), UnitId(0), UnitId(2)]);
    }

    #[test]
    fn ties_keep_prior_position() {
        let state = create_test_state(&[100.0, 100.0]);
        assert_eq!(state.queue.order(), vec![UnitId(0), UnitId(1)]);
        let state = advance_timeline(state, 100.0);
        let state = sync_queue(state);
        assert_eq!(state.queue.order(), vec![UnitId(0), UnitId(1)]);
    }

    #[test]
    fn timeline_advance_floors_at_zero_and_tracks_time() {
        let state = create_test_state(&[100.0, 50.0]);
        let state = advance_timeline(state, 150.0);
        assert_eq!(av(&state, 0), 0.0);
        assert_eq!(av(&state, 1), 50.0);
        assert_eq!(state.time, 150.0);
    }

    #[test]
    fn percent_and_fixed_advance() {
        let state = create_test_state(&[100.0]);
        let state = advance_action(state, UnitId(0), Advance::Percent(0.3));
        assert!((av(&state, 0) - 70.0).abs() < 1e-9);
        let state = advance_action(state, UnitId(0), Advance::Fixed(100.0));
        assert_eq!(av(&state, 0), 0.0);
    }

    #[test]
    fn delay_mirrors_advance() {
        let state = create_test_state(&[100.0]);
        let state = advance_timeline(state, 50.0);
        let state = delay_action(state, UnitId(0), Advance::Percent(0.3));
        assert!((av(&state, 0) - 80.0).abs() < 1e-9);
        let state = delay_action(state, UnitId(0), Advance::Fixed(25.0));
        assert!((av(&state, 0) - 105.0).abs() < 1e-9);
    }

    #[test]
    fn gauge_delay_uses_action_points() {
        let state = create_test_state(&[100.0]);
        let state = advance_timeline(state, 50.0);
        let state = delay_gauge(state, UnitId(0), 0.3);
        assert!((av(&state, 0) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn speed_change_rescales_remaining_value() {
        let mut state = create_test_state(&[100.0]);
        state = advance_timeline(state, 40.0);
        let unit = state.unit_mut(UnitId(0)).expect("unit");
        unit.base_stats.set(StatKey::Spd, 120.0);
        unit.recalculate_stats();
        let state = rescale_for_speed(state, UnitId(0), 100.0);
        assert!((av(&state, 0) - 60.0 * 100.0 / 120.0).abs() < 1e-9);
    }

    #[test]
    fn reset_restores_full_turn() {
        let state = create_test_state(&[125.0]);
        let state = advance_timeline(state, 80.0);
        let state = reset_for_turn(state, UnitId(0));
        assert_eq!(av(&state, 0), 80.0);
    }

    #[test]
    fn dead_units_leave_the_queue() {
        let mut state = create_test_state(&[100.0, 90.0]);
        state.unit_mut(UnitId(1)).expect("unit").hp = 0.0;
        let state = sync_queue(state);
        assert_eq!(state.queue.order(), vec![UnitId(0)]);
    }

    #[test]
    fn queue_entry_for_missing_unit_is_an_error() {
        let mut state = create_test_state(&[100.0]);
        state.units.clear();
        assert_eq!(
            next_actor(&state),
            Err(EngineError::UnknownQueueEntry(UnitId(0)))
        );
    }
}
