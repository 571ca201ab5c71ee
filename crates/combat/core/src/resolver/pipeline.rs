//! Action resolution pipeline.
//!
//! Resolving an ability runs these steps in order:
//! 1. Pay the cost (skill points, energy)
//! 2. Resolve targets and expand the damage shape into hits
//! 3. Process each hit: `BeforeDamageCalculation`, toughness, damage, break
//! 4. Heal and shield
//! 5. Grant ability energy
//! 6. Append the log entry
//! 7. Publish the ability event
//! 8. Roll and apply the ability's effects
//! 9. Publish `ActionComplete`
//!
//! Any handler error stops the pipeline and propagates up.

use tracing::{debug, warn};

use crate::config::BattleConfig;
use crate::damage::{self, DamageKind};
use crate::effects;
use crate::error::Result;
use crate::event::{self, Event};
use crate::rng::RollContext;
use crate::state::{
    Ability, AbilityEffect, AbilityEffectKind, ActionKind, Effect, EffectId, EffectSnapshot,
    EffectTarget, LogEntry, UnitId, UnitSnapshot, WorldState,
};
use crate::stats::StatKey;

use super::apply::{
    DamageInstance, ShieldGrant, add_energy, apply_damage, apply_healing, apply_shield,
    lower_toughness, trigger_break,
};
use super::targeting::{Hit, Hits, generate_hits, pick_bounce_target, resolve_targets};

/// Running totals of one action, read back from the battle statistics.
#[derive(Clone, Copy, Debug, Default)]
struct Totals {
    damage: f64,
    healing: f64,
    shield: f64,
}

impl Totals {
    fn of(state: &WorldState, actor: UnitId) -> Self {
        Self {
            damage: state.result.damage_of(actor),
            healing: state
                .result
                .healing_by_unit
                .get(&actor)
                .copied()
                .unwrap_or(0.0),
            shield: state
                .result
                .shield_by_unit
                .get(&actor)
                .copied()
                .unwrap_or(0.0),
        }
    }

    fn since(self, before: Self) -> Self {
        Self {
            damage: self.damage - before.damage,
            healing: self.healing - before.healing,
            shield: self.shield - before.shield,
        }
    }
}

/// Resolve one ability use by `actor`.
///
/// A missing or dead actor, or an ability slot the actor does not have, is a
/// no-op. `target` is the requested main target; an invalid one falls back
/// to the default target of the ability.
pub fn resolve_action(
    mut state: WorldState,
    actor: UnitId,
    kind: ActionKind,
    target: Option<UnitId>,
) -> Result<WorldState> {
    let Some(unit) = state.unit(actor).filter(|unit| unit.is_alive()) else {
        return Ok(state);
    };
    let Some(ability) = unit.abilities.get(kind).cloned() else {
        warn!(
            target: "combat::resolver",
            unit = %actor,
            action = kind.as_str(),
            "unit has no ability for action"
        );
        return Ok(state);
    };
    debug!(
        target: "combat::resolver",
        unit = %actor,
        action = kind.as_str(),
        ability = %ability.name,
        "resolving action"
    );
    let before = Totals::of(&state, actor);

    state = pay_cost(state, actor, kind, &ability);

    let targets = resolve_targets(&state, actor, ability.target, target);
    let mut hits = Hits::new();
    for hit in generate_hits(&mut state, actor, &ability, &targets) {
        let hit = if hit.bounce {
            match pick_bounce_target(&mut state, actor) {
                Some(target) => hit.aimed_at(target),
                None => break,
            }
        } else {
            hit
        };
        state = process_hit(state, actor, kind, &ability, hit)?;
        hits.push(hit);
    }

    state = apply_support(state, actor, &ability, &targets)?;
    state = add_energy(state, actor, ability.energy_gain, 0.0);

    let totals = Totals::of(&state, actor).since(before);
    state = push_log(state, actor, kind, &ability, &targets, totals);

    state = event::publish(state, &Event::for_action(kind, actor, targets.clone()))?;
    for effect in &ability.effects {
        state = apply_ability_effect(state, actor, effect, &targets, &hits)?;
    }
    event::publish(
        state,
        &Event::ActionComplete {
            source: actor,
            action: kind,
        },
    )
}

/// Resolve queued follow-ups and counters until the queue is empty.
///
/// Actions queued while draining are resolved in the same pass. Draining
/// stops after [`BattleConfig::MAX_PENDING_ACTIONS`] actions; the rest stay
/// queued.
pub fn drain_pending(mut state: WorldState) -> Result<WorldState> {
    let mut resolved = 0;
    while let Some(action) = state.pending.pop_front() {
        if resolved >= BattleConfig::MAX_PENDING_ACTIONS {
            state.pending.push_front(action);
            warn!(
                target: "combat::resolver",
                remaining = state.pending.len(),
                "pending action limit reached"
            );
            break;
        }
        state = resolve_action(state, action.actor, action.kind, action.target)?;
        resolved += 1;
    }
    Ok(state)
}

// ============================================================================
// Cost
// ============================================================================

/// Basic attacks by characters generate a skill point, skills spend them and
/// ultimates drain energy. Enemies and summons never touch skill points.
fn pay_cost(mut state: WorldState, actor: UnitId, kind: ActionKind, ability: &Ability) -> WorldState {
    let party_member = state
        .unit(actor)
        .is_some_and(|unit| !unit.is_enemy() && !unit.is_summon());
    match kind {
        ActionKind::Basic if party_member => state.gain_skill_points(1),
        ActionKind::Skill if party_member => {
            state.spend_skill_points(ability.sp_cost.unwrap_or(1));
        }
        ActionKind::Ultimate => {
            if let Some(unit) = state.unit_mut(actor) {
                unit.ep = 0.0;
            }
        }
        _ => {}
    }
    state
}

// ============================================================================
// Hits
// ============================================================================

/// Resolve one hit, then clear the one-shot damage modifiers whatever the
/// outcome.
fn process_hit(
    state: WorldState,
    actor: UnitId,
    kind: ActionKind,
    ability: &Ability,
    hit: Hit,
) -> Result<WorldState> {
    let mut state = land_hit(state, actor, kind, ability, hit)?;
    state.damage_modifiers.reset();
    Ok(state)
}

fn land_hit(
    mut state: WorldState,
    actor: UnitId,
    kind: ActionKind,
    ability: &Ability,
    hit: Hit,
) -> Result<WorldState> {
    let Some(element) = state.unit(actor).map(|unit| unit.element) else {
        return Ok(state);
    };
    if !state.unit(hit.target).is_some_and(|unit| unit.is_alive()) {
        return Ok(state);
    }
    state = event::publish(
        state,
        &Event::BeforeDamageCalculation {
            source: actor,
            target: hit.target,
            action: kind,
            element,
        },
    )?;
    let modifiers = state.damage_modifiers;

    let (Some(attacker), Some(defender)) = (state.unit(actor), state.unit(hit.target)) else {
        return Ok(state);
    };
    let toughness = damage::toughness_reduction(
        attacker,
        ability.toughness_for_hit(kind, hit.adjacent),
        &modifiers,
    );
    let already_broken = defender.is_broken() && defender.weaknesses.has(element);
    let crit_chance = damage::crit_chance(attacker, &modifiers);
    let scaling = ability
        .damage
        .as_ref()
        .map_or(StatKey::Atk, |spec| spec.scaling);

    let (mut state, broke) = lower_toughness(state, actor, hit.target, toughness);
    let is_crit = state.rng.chance(crit_chance, RollContext::Crit);
    let (Some(attacker), Some(defender)) = (state.unit(actor), state.unit(hit.target)) else {
        return Ok(state);
    };
    let amount = damage::direct_damage(
        attacker,
        defender,
        scaling,
        hit.multiplier,
        kind,
        &modifiers,
        is_crit,
    );
    let super_break = if already_broken {
        damage::super_break_damage(attacker, defender, toughness, &modifiers)
    } else {
        0.0
    };

    state = apply_damage(
        state,
        DamageInstance::new(actor, hit.target, amount, DamageKind::Direct)
            .from_action(kind)
            .critical(is_crit),
    )?;
    if broke {
        state = trigger_break(state, actor, hit.target)?;
    } else if super_break > 0.0 {
        state = apply_damage(
            state,
            DamageInstance::new(actor, hit.target, super_break, DamageKind::SuperBreak),
        )?;
    }
    Ok(state)
}

// ============================================================================
// Healing and Shields
// ============================================================================

fn apply_support(
    mut state: WorldState,
    actor: UnitId,
    ability: &Ability,
    targets: &[UnitId],
) -> Result<WorldState> {
    if ability.heal.is_none() && ability.shield.is_none() {
        return Ok(state);
    }
    // Offensive abilities heal and shield their user.
    let recipients: Vec<UnitId> = if ability.target.is_offensive() {
        vec![actor]
    } else {
        targets.to_vec()
    };
    for recipient in recipients {
        if let Some(spec) = &ability.heal {
            let amount = match (state.unit(actor), state.unit(recipient)) {
                (Some(source), Some(target)) => damage::heal_amount(source, target, spec),
                _ => continue,
            };
            state = apply_healing(state, actor, recipient, amount)?;
        }
        if let Some(spec) = &ability.shield {
            let Some(value) = state.unit(actor).map(|unit| damage::shield_amount(unit, spec))
            else {
                continue;
            };
            let mut grant = ShieldGrant::new(format!("{} Shield", ability.name), value, spec.duration);
            if let Some(cap) = spec.cap {
                grant = grant.capped(cap);
            }
            if spec.stackable {
                grant = grant.stacking();
            }
            state = apply_shield(state, actor, recipient, grant)?;
        }
    }
    Ok(state)
}

// ============================================================================
// Log
// ============================================================================

fn push_log(
    mut state: WorldState,
    actor: UnitId,
    kind: ActionKind,
    ability: &Ability,
    targets: &[UnitId],
    totals: Totals,
) -> WorldState {
    let Some(unit) = state.unit(actor) else {
        return state;
    };
    let mut entry = LogEntry::new(unit, ability.name.clone(), state.time, state.skill_points);
    entry.kind = Some(kind);
    entry.damage = totals.damage;
    entry.healing = totals.healing;
    entry.shield = totals.shield;
    entry.effects = EffectSnapshot::all_of(unit);
    for target in targets.iter().filter_map(|id| state.unit(*id)) {
        entry.targets.push(UnitSnapshot::of(target));
        if target.id != actor {
            entry.effects.extend(EffectSnapshot::all_of(target));
        }
    }
    state.log.push(entry);
    state
}

// ============================================================================
// Ability Effects
// ============================================================================

/// Roll `effect` against each recipient and apply it where it lands.
///
/// A recipient hit several times gets one roll per hit; any success applies.
fn apply_ability_effect(
    mut state: WorldState,
    actor: UnitId,
    effect: &AbilityEffect,
    targets: &[UnitId],
    hits: &[Hit],
) -> Result<WorldState> {
    let recipients: Vec<UnitId> = match effect.target {
        EffectTarget::Targets => targets.to_vec(),
        EffectTarget::SelfOnly => vec![actor],
        EffectTarget::AllEnemies => state.opponents_of(actor),
        EffectTarget::AllAllies => state.teammates_of(actor),
    };
    for recipient in recipients {
        let chance = match (state.unit(actor), state.unit(recipient)) {
            (Some(source), Some(target)) if source.is_alive() && target.is_alive() => {
                damage::effect_hit_chance(source, target, effect)
            }
            _ => continue,
        };
        let rolls = hits.iter().filter(|hit| hit.target == recipient).count().max(1);
        let landed = (0..rolls).any(|_| state.rng.chance(chance, RollContext::EffectHit));
        if !landed {
            debug!(
                target: "combat::resolver",
                source = %actor,
                unit = %recipient,
                chance,
                "effect resisted"
            );
            continue;
        }
        state = land_effect(state, actor, recipient, &effect.kind)?;
    }
    Ok(state)
}

fn land_effect(
    state: WorldState,
    actor: UnitId,
    recipient: UnitId,
    kind: &AbilityEffectKind,
) -> Result<WorldState> {
    let built = match kind {
        AbilityEffectKind::Cleanse { count } => return effects::cleanse(state, recipient, *count),
        AbilityEffectKind::Dispel { count } => return effects::dispel(state, recipient, *count),
        AbilityEffectKind::Buff {
            name,
            modifiers,
            duration,
            max_stacks,
        } => {
            let mut buff = Effect::buff(EffectId::scoped(name, actor, recipient), name.clone(), actor)
                .turn_end(*duration)
                .with_stacks(1, *max_stacks)
                .skip_first_turn_decrement();
            buff.modifiers = modifiers.clone();
            buff
        }
        AbilityEffectKind::Debuff {
            name,
            modifiers,
            duration,
            max_stacks,
        } => {
            let mut debuff =
                Effect::debuff(EffectId::scoped(name, actor, recipient), name.clone(), actor)
                    .turn_end(*duration)
                    .with_stacks(1, *max_stacks);
            debuff.modifiers = modifiers.clone();
            debuff
        }
        AbilityEffectKind::Freeze { duration } => {
            let (Some(source), Some(target)) = (state.unit(actor), state.unit(recipient)) else {
                return Ok(state);
            };
            effects::freeze_effect(source, target, *duration)
        }
        AbilityEffectKind::Dot {
            dot_type,
            multiplier,
            duration,
        } => {
            let (Some(source), Some(target)) = (state.unit(actor), state.unit(recipient)) else {
                return Ok(state);
            };
            effects::dot_effect(source, target, *dot_type, *multiplier, *duration)
        }
    };
    effects::attach(state, recipient, built)
}
