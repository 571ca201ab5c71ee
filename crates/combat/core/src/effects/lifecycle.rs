//! Attach, refresh and detach.

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::event::{self, Event, HandlerRegistration};
use crate::schedule;
use crate::state::{DurationPolicy, Effect, EffectId, HandlerId, UnitFlags, UnitId, WorldState};

/// Attach `effect` to `target`.
///
/// Re-applying an effect with the same id and source refreshes it instead:
/// one more stack (up to the cap), the new duration, no callbacks. The same
/// id from a different source replaces the existing effect.
///
/// Attaching a debuff to a debuff-immune unit, or anything to a missing
/// unit, leaves the state unchanged.
pub fn attach(state: WorldState, target: UnitId, effect: Effect) -> Result<WorldState> {
    let Some(unit) = state.unit(target) else {
        return Ok(state);
    };
    if effect.is_debuff() && unit.flags.contains(UnitFlags::DEBUFF_IMMUNE) {
        debug!(
            target: "combat::effects",
            unit = %target,
            effect = %effect.id,
            "debuff ignored by immune unit"
        );
        return Ok(state);
    }
    if effect.stacks == 0 || effect.max_stacks == 0 || effect.stacks > effect.max_stacks {
        return Err(EngineError::InvalidStackCount {
            effect: effect.id,
            stacks: effect.stacks,
            max_stacks: effect.max_stacks,
        });
    }
    if let DurationPolicy::Tied {
        unit: parent_unit,
        effect: parent,
    } = &effect.duration
    {
        let parent_exists = state
            .unit(*parent_unit)
            .is_some_and(|owner| owner.has_effect(parent));
        if !parent_exists {
            return Err(EngineError::DanglingTie {
                unit: target,
                effect: effect.id,
                parent: parent.clone(),
            });
        }
    }

    match unit.effect(&effect.id).map(|existing| existing.source) {
        Some(source) if source == effect.source => refresh(state, target, effect),
        Some(_) => {
            let state = detach(state, target, &effect.id)?;
            attach_fresh(state, target, effect)
        }
        None => attach_fresh(state, target, effect),
    }
}

fn refresh(mut state: WorldState, target: UnitId, effect: Effect) -> Result<WorldState> {
    let turn_owner = state.current_turn_owner;
    let Some(unit) = state.unit_mut(target) else {
        return Ok(state);
    };
    let old_speed = unit.speed();
    let Some(existing) = unit.effect_mut(&effect.id) else {
        return Ok(state);
    };
    existing.max_stacks = effect.max_stacks;
    existing.stacks = (existing.stacks + 1).min(existing.max_stacks);
    existing.remaining = effect.remaining;
    existing.modifiers = effect.modifiers;
    existing.kind = effect.kind;
    if existing.skip_first_turn_decrement && turn_owner == Some(target) {
        existing.applied_during_turn_of = Some(target);
    }
    debug!(
        target: "combat::effects",
        unit = %target,
        effect = %effect.id,
        stacks = existing.stacks,
        "effect refreshed"
    );
    unit.recalculate_stats();
    unit.sync_shield();

    let state = schedule::rescale_for_speed(state, target, old_speed);
    event::publish(
        state,
        &Event::EffectApplied {
            source: effect.source,
            target,
            effect: effect.id,
        },
    )
}

fn attach_fresh(mut state: WorldState, target: UnitId, mut effect: Effect) -> Result<WorldState> {
    if let DurationPolicy::Tied {
        unit: parent_unit,
        effect: parent,
    } = &effect.duration
    {
        state
            .ties
            .link((*parent_unit, parent.clone()), (target, effect.id.clone()));
    }

    if !effect.subscriptions.is_empty() && effect.hooks.is_some() {
        let registration = subscription(target, &effect);
        state = event::register(state, registration);
    }

    if let Some(hooks) = effect.hooks.clone() {
        state = hooks.on_attach(state, target, &effect)?;
    }

    if effect.skip_first_turn_decrement && state.current_turn_owner == Some(target) {
        effect.applied_during_turn_of = Some(target);
    }

    let id = effect.id.clone();
    let source = effect.source;
    let Some(unit) = state.unit_mut(target) else {
        return Ok(state);
    };
    let old_speed = unit.speed();
    unit.effects.push(effect);
    unit.recalculate_stats();
    unit.sync_shield();
    debug!(
        target: "combat::effects",
        unit = %target,
        effect = %id,
        "effect attached"
    );

    let state = schedule::rescale_for_speed(state, target, old_speed);
    event::publish(
        state,
        &Event::EffectApplied {
            source,
            target,
            effect: id,
        },
    )
}

/// Registration that forwards subscribed events to the effect's hooks while
/// the effect is still attached.
fn subscription(owner: UnitId, effect: &Effect) -> HandlerRegistration {
    let effect_id = effect.id.clone();
    HandlerRegistration::new(
        HandlerId::for_effect(owner, &effect.id),
        effect.subscriptions.iter().copied(),
        move |event, state, _| {
            let Some(current) = state
                .unit(owner)
                .and_then(|unit| unit.effect(&effect_id))
                .cloned()
            else {
                return Ok(state);
            };
            match current.hooks.clone() {
                Some(hooks) => hooks.on_event(event, state, owner, &current),
                None => Ok(state),
            }
        },
    )
}

/// Detach `effect_id` from `target`, first cascading through every effect
/// tied to it. Missing units or effects leave the state unchanged.
pub fn detach(mut state: WorldState, target: UnitId, effect_id: &EffectId) -> Result<WorldState> {
    let Some(effect) = state
        .unit(target)
        .and_then(|unit| unit.effect(effect_id))
        .cloned()
    else {
        return Ok(state);
    };

    let dependents = state.ties.take_dependents(&(target, effect_id.clone()));
    for (unit, child) in dependents {
        state = detach(state, unit, &child)?;
    }
    if let DurationPolicy::Tied {
        unit: parent_unit,
        effect: parent,
    } = &effect.duration
    {
        state.ties.unlink(
            &(*parent_unit, parent.clone()),
            &(target, effect_id.clone()),
        );
    }

    state = event::unregister(state, &HandlerId::for_effect(target, effect_id));

    if let Some(hooks) = effect.hooks.clone() {
        state = hooks.on_detach(state, target, &effect)?;
    }

    let Some(unit) = state.unit_mut(target) else {
        return Ok(state);
    };
    let old_speed = unit.speed();
    unit.effects.retain(|attached| &attached.id != effect_id);
    unit.recalculate_stats();
    unit.sync_shield();
    debug!(
        target: "combat::effects",
        unit = %target,
        effect = %effect_id,
        "effect detached"
    );

    let state = schedule::rescale_for_speed(state, target, old_speed);
    event::publish(
        state,
        &Event::EffectRemoved {
            source: effect.source,
            target,
            effect: effect.id,
        },
    )
}

/// Detach every effect on `target` matching `predicate`, in attach order.
pub fn detach_where(
    mut state: WorldState,
    target: UnitId,
    predicate: impl Fn(&Effect) -> bool,
) -> Result<WorldState> {
    let ids: Vec<EffectId> = state
        .unit(target)
        .map(|unit| {
            unit.effects
                .iter()
                .filter(|effect| predicate(effect))
                .map(|effect| effect.id.clone())
                .collect()
        })
        .unwrap_or_default();
    for id in ids {
        state = detach(state, target, &id)?;
    }
    Ok(state)
}
