//! Battle loop.
//!
//! [`run`] publishes `BattleStart` and repeatedly calls [`step`] until one
//! side is defeated, the round budget runs out, or [`BattleConfig::MAX_TURNS`]
//! steps have been taken. Each step gives one turn to the unit at the head of
//! the action queue:
//!
//! 1. Advance the timeline to the actor and check for ultimate interrupts
//! 2. `TurnStart`, DoT ticks, turn-start durations, entanglement damage
//! 3. Crowd control or an unrecovered weakness break skips the turn
//! 4. Pick and resolve the action, then drain pending follow-ups
//! 5. `TurnEnd`, rotation, turn-end durations, handler cooldowns

use tracing::{debug, info};

use crate::config::BattleConfig;
use crate::damage::{self, DamageKind, DamageModifiers};
use crate::effects;
use crate::error::Result;
use crate::event::{self, Event};
use crate::resolver::{self, DamageInstance};
use crate::schedule::{self, Advance};
use crate::state::{
    ActionKind, BreakStatus, DotCalc, DotType, DurationPolicy, EffectCaps, EffectId, EffectKind,
    EffectSnapshot, LogEntry, Outcome, UltStrategy, Unit, UnitId, WorldState,
};
use crate::stats::Element;

/// Run the battle to completion.
///
/// Handlers must be registered before calling this; `run` only publishes
/// `BattleStart` and drives turns.
pub fn run(mut state: WorldState) -> Result<WorldState> {
    state.validate()?;
    info!(
        target: "combat::simulation",
        units = state.units.len(),
        rounds = state.config.rounds,
        seed = state.config.seed,
        "battle start"
    );
    state = schedule::sync_queue(state);
    state = event::publish(state, &Event::BattleStart)?;
    state = check_ultimates(state)?;

    let mut turns = 0;
    let outcome = loop {
        if let Some(decided) = outcome_of(&state) {
            break decided;
        }
        if turns >= BattleConfig::MAX_TURNS {
            break Outcome::Timeout;
        }
        state = step(state)?;
        turns += 1;
    };

    state.result.turns = turns;
    state.result.outcome = Some(outcome);
    info!(
        target: "combat::simulation",
        outcome = outcome.as_str(),
        turns,
        time = state.time,
        total_damage = state.result.total_damage,
        "battle finished"
    );
    Ok(state)
}

/// Outcome of the battle if it is over.
pub fn outcome_of(state: &WorldState) -> Option<Outcome> {
    if state.living_enemies().next().is_none() {
        Some(Outcome::Victory)
    } else if state.living_allies().next().is_none() {
        Some(Outcome::Defeat)
    } else if state.time >= state.config.time_limit() {
        Some(Outcome::Timeout)
    } else {
        None
    }
}

/// Give one turn to the unit at the head of the action queue.
pub fn step(mut state: WorldState) -> Result<WorldState> {
    if state.queue.is_empty() {
        state = schedule::sync_queue(state);
    }
    let Some(actor) = schedule::next_actor(&state)? else {
        return Ok(state);
    };
    let wait = state
        .queue
        .first()
        .map_or(0.0, |entry| entry.action_value);
    state = schedule::advance_timeline(state, wait);
    state = check_ultimates(state)?;

    if !state.unit(actor).is_some_and(Unit::is_alive) {
        return Ok(schedule::sync_queue(state));
    }
    debug!(
        target: "combat::simulation",
        unit = %actor,
        time = state.time,
        "turn start"
    );
    state.current_turn_owner = Some(actor);
    state = schedule::reset_for_turn(state, actor);
    state = event::publish(state, &Event::TurnStart { unit: actor })?;

    state = tick_dots(state, actor)?;
    state = effects::tick_turn_start(state, actor)?;
    state = entanglement_damage(state, actor)?;
    if !state.unit(actor).is_some_and(Unit::is_alive) {
        return finish_turn(state, actor, false, false);
    }

    if let Some(effect) = state.unit(actor).and_then(effects::crowd_control_effect) {
        let (id, name) = (effect.id.clone(), effect.name.clone());
        state = skip_for_crowd_control(state, actor, &id)?;
        return skip_turn(state, actor, &name);
    }

    if needs_toughness_recovery(&state, actor) {
        state = event::publish(state, &Event::WeaknessBreakRecoveryAttempt { unit: actor })?;
        let held = state.unit(actor).is_some_and(|unit| {
            unit.effects
                .iter()
                .any(|effect| effect.caps.contains(EffectCaps::SKIP_TOUGHNESS_RECOVERY))
        });
        if held {
            return skip_turn(state, actor, "Broken");
        }
        if let Some(unit) = state.unit_mut(actor) {
            unit.toughness = unit.max_toughness;
        }
    }

    let Some((kind, target)) = choose_action(&mut state, actor) else {
        return finish_turn(state, actor, true, false);
    };
    state = resolver::resolve_action(state, actor, kind, target)?;
    if kind == ActionKind::Ultimate {
        state = start_ult_cooldown(state, actor);
    }
    state = resolver::drain_pending(state)?;
    state = check_ultimates(state)?;

    let holds_turn = state.unit(actor).is_some_and(|unit| {
        unit.effects
            .iter()
            .any(|effect| effect.caps.contains(EffectCaps::PREVENT_TURN_END))
    });
    if holds_turn {
        state.current_turn_owner = None;
        return Ok(schedule::sync_queue(state));
    }
    state = event::publish(state, &Event::TurnEnd { unit: actor })?;
    state = finish_turn(state, actor, kind != ActionKind::Ultimate, kind == ActionKind::Ultimate)?;
    check_ultimates(state)
}

// ============================================================================
// Turn Start
// ============================================================================

/// One tick of every DoT on the acting unit.
fn tick_dots(mut state: WorldState, actor: UnitId) -> Result<WorldState> {
    let dots: Vec<(UnitId, DotType, DotCalc, u32)> = state
        .unit(actor)
        .map(|unit| {
            unit.effects
                .iter()
                .filter(|effect| effect.duration == DurationPolicy::TurnStart)
                .filter_map(|effect| match effect.kind {
                    EffectKind::Dot { dot_type, calc } => {
                        Some((effect.source, dot_type, calc, effect.stacks))
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    for (source, dot_type, calc, stacks) in dots {
        let amount = match (state.unit(source), state.unit(actor)) {
            (Some(attacker), Some(target)) if target.is_alive() => damage::dot_damage(
                attacker,
                target,
                dot_type,
                calc,
                stacks,
                &DamageModifiers::default(),
            ),
            _ => continue,
        };
        state = resolver::apply_damage(
            state,
            DamageInstance::new(source, actor, amount, DamageKind::Dot),
        )?;
        state = event::publish(
            state,
            &Event::DotDamage {
                source,
                target: actor,
                amount,
                dot_type,
            },
        )?;
    }
    Ok(state)
}

/// Entangled units take `damage_per_stack × stacks` Quantum damage when their
/// turn starts.
fn entanglement_damage(state: WorldState, actor: UnitId) -> Result<WorldState> {
    let entanglement = state.unit(actor).and_then(|unit| {
        unit.effects.iter().find_map(|effect| match effect.kind {
            EffectKind::BreakStatus {
                status: BreakStatus::Entanglement,
                damage_per_stack,
                ..
            } => Some((effect.source, damage_per_stack * f64::from(effect.stacks))),
            _ => None,
        })
    });
    let Some((source, base)) = entanglement else {
        return Ok(state);
    };
    break_additional(state, source, actor, base, Element::Quantum)
}

fn break_additional(
    state: WorldState,
    source: UnitId,
    target: UnitId,
    base: f64,
    element: Element,
) -> Result<WorldState> {
    let amount = match (state.unit(source), state.unit(target)) {
        (Some(attacker), Some(defender)) => damage::break_additional_damage(
            attacker,
            defender,
            base,
            element,
            &DamageModifiers::default(),
        ),
        _ => return Ok(state),
    };
    resolver::apply_damage(
        state,
        DamageInstance::new(source, target, amount, DamageKind::BreakAdditional),
    )
}

/// Count down the crowd-control effect holding the actor. Freeze deals its
/// damage here and, on expiry, pulls the next turn forward.
///
/// Only turn-start effects count down here; turn-end ones tick in
/// [`finish_turn`].
fn skip_for_crowd_control(
    mut state: WorldState,
    actor: UnitId,
    id: &EffectId,
) -> Result<WorldState> {
    let Some(effect) = state.unit(actor).and_then(|unit| unit.effect(id)) else {
        return Ok(state);
    };
    let source = effect.source;
    let counts_down = effect.duration == DurationPolicy::TurnStart;
    let freeze = match effect.kind {
        EffectKind::BreakStatus {
            status: BreakStatus::Freeze,
            damage_per_stack,
            ..
        } => Some(damage_per_stack),
        _ => None,
    };
    if let Some(base) = freeze {
        state = break_additional(state, source, actor, base, Element::Ice)?;
    }
    if !counts_down {
        return Ok(state);
    }

    let (next, expired) = effects::count_down(state, actor, id)?;
    state = next;
    if expired {
        if freeze.is_some() {
            state = schedule::advance_action(
                state,
                actor,
                Advance::Percent(BattleConfig::FREEZE_REMOVAL_ADVANCE),
            );
        }
    }
    Ok(state)
}

fn needs_toughness_recovery(state: &WorldState, actor: UnitId) -> bool {
    state
        .unit(actor)
        .is_some_and(|unit| unit.is_enemy() && unit.is_broken())
}

/// Log a skipped turn and run the turn-end bookkeeping without advancing the
/// rotation.
fn skip_turn(mut state: WorldState, actor: UnitId, reason: &str) -> Result<WorldState> {
    if let Some(unit) = state.unit(actor) {
        let mut entry = LogEntry::new(
            unit,
            format!("Turn skipped ({reason})"),
            state.time,
            state.skill_points,
        );
        entry.effects = EffectSnapshot::all_of(unit);
        state.log.push(entry);
    }
    debug!(target: "combat::simulation", unit = %actor, reason, "turn skipped");
    state = finish_turn(state, actor, false, false)?;
    check_ultimates(state)
}

// ============================================================================
// Action Selection
// ============================================================================

/// Decide the acting unit's action.
///
/// - Enemies basic-attack an aggro-weighted target.
/// - Summons use their skill on the first opponent.
/// - Characters fire a cooldown-strategy ultimate when ready, otherwise
///   follow their rotation; a skill step without enough skill points falls
///   back to a basic attack.
fn choose_action(state: &mut WorldState, actor: UnitId) -> Option<(ActionKind, Option<UnitId>)> {
    let unit = state.unit(actor)?;
    if unit.is_enemy() {
        let target = resolver::pick_weighted_target(state, actor)?;
        return Some((ActionKind::Basic, Some(target)));
    }
    let first_opponent = state.opponents_of(actor).first().copied();
    if unit.is_summon() {
        let kind = if unit.abilities.skill.is_some() {
            ActionKind::Skill
        } else {
            ActionKind::Basic
        };
        return Some((kind, first_opponent));
    }

    let Some(config) = &unit.actor else {
        return Some((ActionKind::Basic, first_opponent));
    };
    if config.ult_strategy == UltStrategy::Cooldown && ultimate_ready(unit) {
        let target = unit
            .abilities
            .ultimate
            .as_ref()
            .and_then(|ability| resolver::default_target(state, actor, ability.target));
        return Some((ActionKind::Ultimate, target));
    }
    if config.step(unit.rotation_index) == Some('s') {
        if let Some(skill) = &unit.abilities.skill {
            let cost = skill.sp_cost.unwrap_or(1);
            if state.skill_points >= cost.max(1) {
                let target = if skill.target.is_offensive() {
                    first_opponent
                } else {
                    Some(actor)
                };
                return Some((ActionKind::Skill, target));
            }
        }
    }
    Some((ActionKind::Basic, first_opponent))
}

fn ultimate_ready(unit: &Unit) -> bool {
    unit.abilities.ultimate.is_some()
        && unit.max_ep() > 0.0
        && unit.ep >= unit.max_ep()
        && unit.ult_cooldown == 0
}

// ============================================================================
// Ultimates
// ============================================================================

/// Fire every ready immediate-strategy ultimate, rescanning the party after
/// each one, up to [`BattleConfig::MAX_ULTIMATE_CHAIN`] in a row.
pub fn check_ultimates(mut state: WorldState) -> Result<WorldState> {
    for _ in 0..BattleConfig::MAX_ULTIMATE_CHAIN {
        if state.living_enemies().next().is_none() {
            break;
        }
        let ready = state.living_allies().find(|unit| {
            unit.actor
                .as_ref()
                .is_some_and(|config| config.ult_strategy == UltStrategy::Immediate)
                && ultimate_ready(unit)
        });
        let Some((actor, target_type)) = ready.and_then(|unit| {
            let ability = unit.abilities.ultimate.as_ref()?;
            Some((unit.id, ability.target))
        }) else {
            break;
        };
        debug!(target: "combat::simulation", unit = %actor, "ultimate interrupt");
        let target = resolver::default_target(&state, actor, target_type);
        state = resolver::resolve_action(state, actor, ActionKind::Ultimate, target)?;
        state = start_ult_cooldown(state, actor);
        state = resolver::drain_pending(state)?;
    }
    Ok(state)
}

fn start_ult_cooldown(mut state: WorldState, actor: UnitId) -> WorldState {
    if let Some(unit) = state.unit_mut(actor) {
        unit.ult_cooldown = unit.actor.as_ref().map_or(0, |config| config.ult_cooldown);
    }
    state
}

// ============================================================================
// Turn End
// ============================================================================

/// Turn-end bookkeeping: rotation, ultimate cooldown, turn-end durations,
/// handler cooldowns and the queue.
fn finish_turn(
    mut state: WorldState,
    actor: UnitId,
    advance_rotation: bool,
    used_ultimate: bool,
) -> Result<WorldState> {
    if let Some(unit) = state.unit_mut(actor) {
        if advance_rotation {
            unit.rotation_index += 1;
        }
        if !used_ultimate {
            unit.ult_cooldown = unit.ult_cooldown.saturating_sub(1);
        }
    }
    state = effects::tick_turn_end(state, actor)?;
    state = event::tick_cooldowns(state);
    state.current_turn_owner = None;
    Ok(schedule::sync_queue(state))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::rng::{FixedRng, RollSource};
    use crate::state::{Abilities, Ability, ActorConfig, DamageSpec, Effect, Faction, TargetType};
    use crate::stats::{ElementSet, StatBlock, StatKey};

    fn create_test_ally(id: u32, atk: f64, spd: f64, rotation: &str) -> Unit {
        Unit::new(
            UnitId(id),
            format!("ally-{id}"),
            Faction::Ally,
            Element::Ice,
            80,
            StatBlock::zeroed()
                .with(StatKey::Hp, 3000.0)
                .with(StatKey::Atk, atk)
                .with(StatKey::Spd, spd)
                .with(StatKey::MaxEp, 120.0),
        )
        .with_actor(ActorConfig::new(rotation))
        .with_abilities(Abilities {
            skill: Some(
                Ability::new("Skill", TargetType::SingleEnemy)
                    .with_damage(DamageSpec::simple(2.0))
                    .with_energy(30.0),
            ),
            ultimate: Some(
                Ability::new("Ultimate", TargetType::AllEnemies)
                    .with_damage(DamageSpec::simple(3.0))
                    .with_energy(5.0),
            ),
            ..Abilities::default()
        })
    }

    fn create_test_enemy(id: u32, hp: f64, atk: f64) -> Unit {
        Unit::new(
            UnitId(id),
            format!("enemy-{id}"),
            Faction::Enemy,
            Element::Physical,
            80,
            StatBlock::zeroed()
                .with(StatKey::Hp, hp)
                .with(StatKey::Atk, atk)
                .with(StatKey::Spd, 80.0),
        )
        .with_toughness(1000.0, ElementSet::empty())
    }

    fn create_test_state(ally: Unit, enemy: Unit) -> WorldState {
        WorldState::new(BattleConfig::default())
            .with_rng(RollSource::with_oracle(0, Arc::new(FixedRng(u32::MAX))))
            .with_unit(ally)
            .and_then(|state| state.with_unit(enemy))
            .expect("valid roster")
    }

    #[test]
    fn weak_party_times_out() {
        let state = create_test_state(
            create_test_ally(0, 10.0, 100.0, "b"),
            create_test_enemy(1, 1_000_000.0, 0.0),
        );
        let state = run(state).expect("run");
        assert_eq!(state.result.outcome, Some(Outcome::Timeout));
        assert!(state.time >= state.config.time_limit());
    }

    #[test]
    fn strong_party_wins() {
        let state = create_test_state(
            create_test_ally(0, 5000.0, 120.0, "sb"),
            create_test_enemy(1, 5000.0, 10.0),
        );
        let state = run(state).expect("run");
        assert_eq!(state.result.outcome, Some(Outcome::Victory));
        assert!(state.result.turns > 0);
    }

    #[test]
    fn rotation_alternates_skill_and_basic() {
        let state = create_test_state(
            create_test_ally(0, 10.0, 200.0, "sb"),
            create_test_enemy(1, 1_000_000.0, 0.0),
        );
        let state = step(state).expect("first");
        let state = step(state).expect("second");
        let kinds: Vec<_> = state
            .log
            .iter()
            .filter(|entry| entry.actor == UnitId(0))
            .map(|entry| entry.kind)
            .collect();
        assert_eq!(kinds, vec![Some(ActionKind::Skill), Some(ActionKind::Basic)]);
    }

    #[test]
    fn empty_skill_points_fall_back_to_basic() {
        let mut state = create_test_state(
            create_test_ally(0, 10.0, 200.0, "s"),
            create_test_enemy(1, 1_000_000.0, 0.0),
        );
        state.skill_points = 0;
        let state = step(state).expect("step");
        assert_eq!(state.log.last().and_then(|entry| entry.kind), Some(ActionKind::Basic));
        assert_eq!(state.skill_points, 1);
    }

    #[test]
    fn full_energy_interrupts_with_ultimate() {
        let mut state = create_test_state(
            create_test_ally(0, 10.0, 100.0, "b"),
            create_test_enemy(1, 1_000_000.0, 0.0),
        );
        state.unit_mut(UnitId(0)).expect("ally").ep = 120.0;
        let state = step(state).expect("step");
        let kinds: Vec<_> = state.log.iter().map(|entry| entry.kind).collect();
        assert_eq!(kinds.first(), Some(&Some(ActionKind::Ultimate)));
    }

    #[test]
    fn frozen_units_skip_and_advance_on_thaw() {
        let state = create_test_state(
            create_test_ally(0, 10.0, 100.0, "b"),
            create_test_enemy(1, 1_000_000.0, 0.0),
        );
        let freeze = {
            let ally = state.unit(UnitId(0)).expect("ally");
            let enemy = state.unit(UnitId(1)).expect("enemy");
            effects::freeze_effect(ally, enemy, 1)
        };
        let mut state = effects::attach(state, UnitId(1), freeze).expect("attach");
        // Make the enemy act first.
        state.unit_mut(UnitId(1)).expect("enemy").action_value = 0.0;
        let state = schedule::sync_queue(state);
        let state = step(state).expect("step");

        let entry = state.log.last().expect("logged");
        assert_eq!(entry.label, "Turn skipped (Freeze)");
        let enemy = state.unit(UnitId(1)).expect("enemy");
        assert!(!effects::is_crowd_controlled(enemy));
        assert!(enemy.hp < 1_000_000.0);
        assert!((enemy.action_value - 125.0 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn stunned_units_skip_their_turn_then_recover() {
        let state = create_test_state(
            create_test_ally(0, 10.0, 100.0, "b"),
            create_test_enemy(1, 1_000_000.0, 500.0),
        );
        let stun = Effect::debuff("stun", "Stun", UnitId(0))
            .turn_start(1)
            .with_caps(EffectCaps::CROWD_CONTROL);
        let mut state = effects::attach(state, UnitId(1), stun).expect("attach");
        state.unit_mut(UnitId(1)).expect("enemy").action_value = 0.0;
        let state = step(schedule::sync_queue(state)).expect("step");

        assert_eq!(state.log.last().expect("logged").label, "Turn skipped (Stun)");
        assert_eq!(state.unit(UnitId(0)).expect("ally").hp, 3000.0);
        assert!(!effects::is_crowd_controlled(state.unit(UnitId(1)).expect("enemy")));
    }

    #[test]
    fn longer_stuns_count_down_once_per_skipped_turn() {
        let state = create_test_state(
            create_test_ally(0, 10.0, 100.0, "b"),
            create_test_enemy(1, 1_000_000.0, 500.0),
        );
        let stun = Effect::debuff("stun", "Stun", UnitId(0))
            .turn_start(2)
            .with_caps(EffectCaps::CROWD_CONTROL);
        let mut state = effects::attach(state, UnitId(1), stun).expect("attach");
        state.unit_mut(UnitId(1)).expect("enemy").action_value = 0.0;
        let state = step(schedule::sync_queue(state)).expect("step");

        let enemy = state.unit(UnitId(1)).expect("enemy");
        let stun = enemy.effect(&EffectId::new("stun")).expect("still stunned");
        assert_eq!(stun.remaining, 1);
    }

    #[test]
    fn broken_enemies_recover_toughness_on_their_turn() {
        let mut state = create_test_state(
            create_test_ally(0, 10.0, 100.0, "b"),
            create_test_enemy(1, 1_000_000.0, 0.0),
        );
        let enemy = state.unit_mut(UnitId(1)).expect("enemy");
        enemy.toughness = 0.0;
        enemy.action_value = 0.0;
        let state = step(schedule::sync_queue(state)).expect("step");
        let enemy = state.unit(UnitId(1)).expect("enemy");
        assert_eq!(enemy.toughness, 1000.0);
    }

    #[test]
    fn outcome_reports_the_losing_side() {
        let mut state = create_test_state(
            create_test_ally(0, 10.0, 100.0, "b"),
            create_test_enemy(1, 100.0, 0.0),
        );
        assert_eq!(outcome_of(&state), None);
        state.unit_mut(UnitId(0)).expect("ally").hp = 0.0;
        assert_eq!(outcome_of(&state), Some(Outcome::Defeat));
        state.unit_mut(UnitId(1)).expect("enemy").hp = 0.0;
        assert_eq!(outcome_of(&state), Some(Outcome::Victory));
    }
}
