//! Primitives that apply calculated numbers to the world state.
//!
//! Both the action pipeline and content-module handlers go through these, so
//! shields, kills, energy rewards and battle statistics behave the same no
//! matter where the damage came from.

use tracing::debug;

use crate::aura;
use crate::config::BattleConfig;
use crate::damage::{self, DamageKind};
use crate::effects;
use crate::error::Result;
use crate::event::{self, Event};
use crate::schedule;
use crate::summon;
use crate::state::{
    ActionKind, BreakStatus, Effect, EffectId, EffectKind, PendingAction, UnitId, WorldState,
};

// ============================================================================
// Damage
// ============================================================================

/// One damage instance ready to be applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageInstance {
    pub source: UnitId,
    pub target: UnitId,
    pub amount: f64,
    pub kind: DamageKind,
    pub action: Option<ActionKind>,
    pub is_crit: bool,
}

impl DamageInstance {
    pub fn new(source: UnitId, target: UnitId, amount: f64, kind: DamageKind) -> Self {
        Self {
            source,
            target,
            amount,
            kind,
            action: None,
            is_crit: false,
        }
    }

    #[must_use]
    pub fn from_action(mut self, action: ActionKind) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn critical(mut self, is_crit: bool) -> Self {
        self.is_crit = is_crit;
        self
    }
}

/// Apply damage to a unit.
///
/// Shields absorb first, in attach order; depleted shields are detached. The
/// remainder comes off HP. A killing blow grants the killer
/// [`BattleConfig::ENEMY_DEFEAT_ENERGY_REWARD`] energy and publishes
/// `UnitDefeated` after `DamageDealt`. Damage to a missing or dead unit is a
/// no-op.
pub fn apply_damage(mut state: WorldState, hit: DamageInstance) -> Result<WorldState> {
    let Some(target) = state.unit_mut(hit.target) else {
        return Ok(state);
    };
    if !target.is_alive() || hit.amount <= 0.0 {
        return Ok(state);
    }

    let mut remaining = hit.amount;
    let mut depleted = Vec::new();
    for effect in &mut target.effects {
        if remaining <= 0.0 {
            break;
        }
        if let EffectKind::Shield { value } = &mut effect.kind {
            let absorbed = value.min(remaining);
            *value -= absorbed;
            remaining -= absorbed;
            if *value <= 0.0 {
                depleted.push(effect.id.clone());
            }
        }
    }
    target.hp = (target.hp - remaining).max(0.0);
    target.sync_shield();
    let killed = !target.is_alive();

    state.result.record_damage(hit.source, hit.amount);
    for id in depleted {
        state = effects::detach(state, hit.target, &id)?;
    }
    if killed && hit.source != hit.target {
        state = add_energy(
            state,
            hit.source,
            0.0,
            BattleConfig::ENEMY_DEFEAT_ENERGY_REWARD,
        );
    }

    state = event::publish(
        state,
        &Event::DamageDealt {
            source: hit.source,
            target: hit.target,
            amount: hit.amount,
            kind: hit.kind,
            action: hit.action,
            is_crit: hit.is_crit,
            killed,
        },
    )?;

    if killed {
        state = defeat(state, hit.target, Some(hit.source))?;
    }
    Ok(state)
}

/// Remove a defeated unit from play: its effects are detached (cascading to
/// anything tied to them), its auras and summons go with it and it leaves the
/// turn queue.
fn defeat(mut state: WorldState, unit: UnitId, killer: Option<UnitId>) -> Result<WorldState> {
    debug!(target: "combat::resolver", unit = %unit, "unit defeated");
    state = effects::detach_where(state, unit, |_| true)?;
    state = aura::remove_auras_by_source(state, unit);
    state = summon::remove_summons_of(state, unit)?;
    state = schedule::sync_queue(state);
    event::publish(state, &Event::UnitDefeated { unit, killer })
}

// ============================================================================
// Healing and Shields
// ============================================================================

/// Heal a living unit, capped at its max HP. Statistics and `UnitHealed`
/// carry the HP actually restored.
pub fn apply_healing(
    mut state: WorldState,
    source: UnitId,
    target: UnitId,
    amount: f64,
) -> Result<WorldState> {
    let Some(unit) = state.unit_mut(target) else {
        return Ok(state);
    };
    if !unit.is_alive() || amount <= 0.0 {
        return Ok(state);
    }
    let healed = amount.min(unit.max_hp() - unit.hp).max(0.0);
    unit.hp += healed;
    state.result.record_healing(source, healed);
    event::publish(
        state,
        &Event::UnitHealed {
            source,
            target,
            amount: healed,
        },
    )
}

/// A shield to grant through [`apply_shield`].
#[derive(Clone, Debug, PartialEq)]
pub struct ShieldGrant {
    pub name: String,
    pub value: f64,
    /// Turn-end turns; zero never expires.
    pub duration: u32,
    pub cap: Option<f64>,
    /// Add to an existing shield of the same name from the same source.
    pub stackable: bool,
}

impl ShieldGrant {
    pub fn new(name: impl Into<String>, value: f64, duration: u32) -> Self {
        Self {
            name: name.into(),
            value,
            duration,
            cap: None,
            stackable: false,
        }
    }

    #[must_use]
    pub fn capped(mut self, cap: f64) -> Self {
        self.cap = Some(cap);
        self
    }

    #[must_use]
    pub fn stacking(mut self) -> Self {
        self.stackable = true;
        self
    }
}

/// Grant a shield. Re-granting a shield with the same name from the same
/// source replaces its value, or adds to it when stackable; the cap applies
/// to the final value.
pub fn apply_shield(
    mut state: WorldState,
    source: UnitId,
    target: UnitId,
    grant: ShieldGrant,
) -> Result<WorldState> {
    let Some(unit) = state.unit(target) else {
        return Ok(state);
    };
    if !unit.is_alive() {
        return Ok(state);
    }
    let id = EffectId::scoped(&grant.name, source, target);
    let existing = match unit.effect(&id).map(|effect| &effect.kind) {
        Some(EffectKind::Shield { value }) if grant.stackable => *value,
        _ => 0.0,
    };
    let mut value = existing + grant.value.max(0.0);
    if let Some(cap) = grant.cap {
        value = value.min(cap);
    }

    let mut shield = Effect::buff(id, grant.name, source)
        .with_kind(EffectKind::Shield { value })
        .skip_first_turn_decrement();
    if grant.duration > 0 {
        shield = shield.turn_end(grant.duration);
    }
    state.result.record_shield(source, (value - existing).max(0.0));
    effects::attach(state, target, shield)
}

// ============================================================================
// Toughness
// ============================================================================

/// Lower `target`'s toughness by `amount` if it is weak to `source`'s
/// element. Returns whether this reduction broke it.
pub(crate) fn lower_toughness(
    mut state: WorldState,
    source: UnitId,
    target: UnitId,
    amount: f64,
) -> (WorldState, bool) {
    let Some(element) = state.unit(source).map(|unit| unit.element) else {
        return (state, false);
    };
    let Some(unit) = state.unit_mut(target) else {
        return (state, false);
    };
    if !unit.weaknesses.has(element) || unit.toughness <= 0.0 || amount <= 0.0 {
        return (state, false);
    }
    unit.toughness = (unit.toughness - amount).max(0.0);
    let broke = unit.toughness <= 0.0;
    (state, broke)
}

/// Weakness break: burst damage, `WeaknessBreak`, then the element's break
/// status. A Quantum break on an already entangled target adds a stack
/// instead of delaying it again.
pub(crate) fn trigger_break(
    mut state: WorldState,
    source: UnitId,
    target: UnitId,
) -> Result<WorldState> {
    let (Some(attacker), Some(defender)) = (state.unit(source), state.unit(target)) else {
        return Ok(state);
    };
    let element = attacker.element;
    let burst = damage::break_damage(attacker, defender, &state.damage_modifiers);
    debug!(
        target: "combat::resolver",
        source = %source,
        unit = %target,
        damage = burst,
        "weakness broken"
    );
    state = apply_damage(
        state,
        DamageInstance::new(source, target, burst, DamageKind::Break),
    )?;
    state = event::publish(
        state,
        &Event::WeaknessBreak {
            source,
            target,
            element,
        },
    )?;

    let (Some(attacker), Some(defender)) = (state.unit(source), state.unit(target)) else {
        return Ok(state);
    };
    if !defender.is_alive() {
        return Ok(state);
    }
    let status = effects::break_effect(attacker, defender);
    let (entangles, delay) = match status.kind {
        EffectKind::BreakStatus { status, delay, .. } => {
            (status == BreakStatus::Entanglement, delay)
        }
        _ => (false, 0.0),
    };
    if entangles && stack_entanglement(&mut state, target) {
        return Ok(state);
    }
    state = effects::attach(state, target, status)?;
    if delay > 0.0 {
        state = schedule::delay_gauge(state, target, delay);
    }
    Ok(state)
}

/// Add a stack to an existing entanglement (from any source) and reset its
/// duration. Returns false when the target is not entangled.
fn stack_entanglement(state: &mut WorldState, target: UnitId) -> bool {
    let Some(unit) = state.unit_mut(target) else {
        return false;
    };
    let Some(existing) = unit.effects.iter_mut().find(|effect| {
        matches!(
            effect.kind,
            EffectKind::BreakStatus {
                status: BreakStatus::Entanglement,
                ..
            }
        )
    }) else {
        return false;
    };
    existing.stacks = (existing.stacks + 1).min(existing.max_stacks);
    existing.remaining = 1;
    true
}

/// Reduce toughness and trigger a weakness break when it crosses zero.
///
/// A target already at zero toughness is not broken again.
pub fn reduce_toughness(
    state: WorldState,
    source: UnitId,
    target: UnitId,
    amount: f64,
) -> Result<WorldState> {
    let (state, broke) = lower_toughness(state, source, target, amount);
    if broke {
        trigger_break(state, source, target)
    } else {
        Ok(state)
    }
}

// ============================================================================
// Energy and Pending Actions
// ============================================================================

/// Grant energy: `base × (1 + ERR) + flat`, capped at max energy.
pub fn add_energy(mut state: WorldState, unit: UnitId, base: f64, flat: f64) -> WorldState {
    if let Some(target) = state.unit_mut(unit) {
        let gain = damage::energy_gain(target, base, flat);
        target.ep = (target.ep + gain).clamp(0.0, target.max_ep());
    }
    state
}

/// Queue an action (follow-up, counter) to resolve after the current one.
pub fn queue_action(mut state: WorldState, action: PendingAction) -> WorldState {
    state.pending.push_back(action);
    state
}
