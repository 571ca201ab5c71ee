//! Effect lifecycle manager.
//!
//! Owns attaching, refreshing and detaching buffs, debuffs and statuses. Every
//! change recomputes the owner's stats and, when speed moved, rescales its
//! action value. Tied effects are tracked in the [`TieIndex`] so that
//! detaching a parent cascades to every dependent on every unit.

mod breaks;
mod duration;
mod lifecycle;
mod purge;
mod ties;

pub use breaks::{break_effect, dot_effect, freeze_effect};
pub use duration::{count_down, tick_turn_end, tick_turn_start};
pub use lifecycle::{attach, detach, detach_where};
pub use purge::{cleanse, dispel};
pub use ties::{EffectRef, TieIndex};

use crate::state::{Effect, Unit};

/// The canonical crowd-control check.
pub fn is_crowd_controlled(unit: &Unit) -> bool {
    crowd_control_effect(unit).is_some()
}

/// First attached crowd-control effect, in attach order.
pub fn crowd_control_effect(unit: &Unit) -> Option<&Effect> {
    unit.effects.iter().find(|effect| effect.is_crowd_control())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::config::BattleConfig;
    use crate::error::{EngineError, Result};
    use crate::event::{Event, EventKind, HandlerRegistration, register};
    use crate::schedule;
    use crate::state::{
        EffectCaps, EffectHooks, EffectId, Faction, UnitFlags, UnitId, WorldState,
    };
    use crate::stats::{Element, Modifier, StatBlock, StatKey};

    fn create_test_unit(id: u32) -> Unit {
        Unit::new(
            UnitId(id),
            format!("unit-{id}"),
            Faction::Ally,
            Element::Wind,
            80,
            StatBlock::zeroed()
                .with(StatKey::Hp, 1000.0)
                .with(StatKey::Atk, 500.0)
                .with(StatKey::Spd, 100.0),
        )
    }

    fn create_test_state() -> WorldState {
        let mut state = WorldState::new(BattleConfig::default());
        for id in 0..3 {
            state.add_unit(create_test_unit(id)).expect("valid unit");
        }
        schedule::sync_queue(state)
    }

    fn atk_buff(id: &str) -> Effect {
        Effect::buff(id, "ATK Up", UnitId(0))
            .turn_end(2)
            .with_stacks(1, 3)
            .with_modifier(Modifier::pct(StatKey::AtkPct, 0.1, "ATK Up"))
    }

    fn unit(state: &WorldState, id: u32) -> &Unit {
        state.unit(UnitId(id)).expect("unit exists")
    }

    #[test]
    fn attach_then_detach_restores_stats() {
        let state = create_test_state();
        let before = unit(&state, 1).stats().clone();
        let state = attach(state, UnitId(1), atk_buff("buff")).expect("attach");
        assert!((unit(&state, 1).stat(StatKey::Atk) - 550.0).abs() < 1e-9);
        let state = detach(state, UnitId(1), &EffectId::new("buff")).expect("detach");
        assert_eq!(unit(&state, 1).stats(), &before);
    }

    #[test]
    fn reapplication_refreshes_instead_of_duplicating() {
        let mut state = create_test_state();
        for _ in 0..5 {
            let mut buff = atk_buff("buff");
            buff.remaining = 4;
            state = attach(state, UnitId(1), buff).expect("attach");
        }
        let target = unit(&state, 1);
        assert_eq!(target.effects.len(), 1);
        assert_eq!(target.effects[0].stacks, 3);
        assert_eq!(target.effects[0].remaining, 4);
        assert!((target.stat(StatKey::Atk) - 650.0).abs() < 1e-9);
    }

    #[test]
    fn refresh_takes_new_duration_even_when_shorter() {
        let state = attach(create_test_state(), UnitId(1), atk_buff("buff").turn_end(5))
            .expect("attach");
        let state = attach(state, UnitId(1), atk_buff("buff").turn_end(1)).expect("refresh");
        assert_eq!(unit(&state, 1).effects[0].remaining, 1);
    }

    #[test]
    fn debuff_immune_units_ignore_debuffs() {
        let mut state = create_test_state();
        state.unit_mut(UnitId(2)).expect("unit").flags |= UnitFlags::DEBUFF_IMMUNE;
        let debuff = Effect::debuff("slow", "Slow", UnitId(0))
            .turn_start(2)
            .with_modifier(Modifier::pct(StatKey::SpdPct, -0.1, "Slow"));
        let state = attach(state, UnitId(2), debuff).expect("attach");
        assert!(unit(&state, 2).effects.is_empty());
    }

    #[test]
    fn tied_effects_cascade_transitively_across_units() {
        let state = create_test_state();
        let aura = Effect::buff("aura", "Aura", UnitId(0));
        let state = attach(state, UnitId(0), aura).expect("attach aura");
        let child = Effect::buff("aura-child", "Aura", UnitId(0)).tied_to(UnitId(0), "aura");
        let state = attach(state, UnitId(1), child).expect("attach child");
        let grandchild =
            Effect::buff("aura-grandchild", "Aura", UnitId(0)).tied_to(UnitId(1), "aura-child");
        let state = attach(state, UnitId(2), grandchild).expect("attach grandchild");

        let state = detach(state, UnitId(0), &EffectId::new("aura")).expect("detach");
        assert!(state.units.iter().all(|unit| unit.effects.is_empty()));
        assert!(state.ties.is_empty());
    }

    #[test]
    fn tying_to_a_missing_parent_is_an_error() {
        let orphan = Effect::buff("orphan", "Orphan", UnitId(0)).tied_to(UnitId(0), "missing");
        let err = attach(create_test_state(), UnitId(1), orphan).expect_err("dangling");
        assert!(matches!(err, EngineError::DanglingTie { .. }));
    }

    #[test]
    fn speed_buff_rescales_remaining_action_value() {
        let state = schedule::advance_timeline(create_test_state(), 40.0);
        let haste = Effect::buff("haste", "Haste", UnitId(0))
            .turn_end(1)
            .with_modifier(Modifier::pct(StatKey::SpdPct, 0.25, "Haste"));
        let state = attach(state, UnitId(1), haste).expect("attach");
        assert!((unit(&state, 1).action_value - 60.0 * 100.0 / 125.0).abs() < 1e-9);
        let state = detach(state, UnitId(1), &EffectId::new("haste")).expect("detach");
        assert!((unit(&state, 1).action_value - 60.0).abs() < 1e-9);
    }

    #[test]
    fn turn_end_ticks_expire_effects() {
        let state = attach(create_test_state(), UnitId(1), atk_buff("buff").turn_end(1))
            .expect("attach");
        let state = tick_turn_end(state, UnitId(1)).expect("tick");
        assert!(unit(&state, 1).effects.is_empty());
    }

    #[test]
    fn first_turn_end_is_skipped_when_applied_on_own_turn() {
        let mut state = create_test_state();
        state.current_turn_owner = Some(UnitId(1));
        let buff = atk_buff("buff").turn_end(1).skip_first_turn_decrement();
        let state = attach(state, UnitId(1), buff).expect("attach");
        let state = tick_turn_end(state, UnitId(1)).expect("first tick");
        assert_eq!(unit(&state, 1).effects[0].remaining, 1);
        let state = tick_turn_end(state, UnitId(1)).expect("second tick");
        assert!(unit(&state, 1).effects.is_empty());
    }

    #[test]
    fn turn_start_tick_leaves_break_statuses_alone() {
        let state = create_test_state();
        let frozen = freeze_effect(unit(&state, 0), unit(&state, 1), 1);
        let state = attach(state, UnitId(1), frozen).expect("attach");
        let state = tick_turn_start(state, UnitId(1)).expect("tick");
        assert!(is_crowd_controlled(unit(&state, 1)));
    }

    #[test]
    fn turn_start_statuses_expire() {
        let mark = Effect::status("mark", "Mark", UnitId(0)).turn_start(1);
        let state = attach(create_test_state(), UnitId(1), mark).expect("attach");
        let state = tick_turn_start(state, UnitId(1)).expect("tick");
        assert!(unit(&state, 1).effects.is_empty());
    }

    #[test]
    fn turn_start_tick_leaves_crowd_control_alone() {
        let stun = Effect::debuff("stun", "Stun", UnitId(0))
            .turn_start(1)
            .with_caps(EffectCaps::CROWD_CONTROL);
        let state = attach(create_test_state(), UnitId(1), stun).expect("attach");
        let state = tick_turn_start(state, UnitId(1)).expect("tick");
        assert_eq!(unit(&state, 1).effects[0].remaining, 1);

        let (state, expired) = count_down(state, UnitId(1), &EffectId::new("stun")).expect("count");
        assert!(expired);
        assert!(unit(&state, 1).effects.is_empty());
    }

    #[test]
    fn cleanse_removes_latest_debuffs_first() {
        let mut state = create_test_state();
        for name in ["first", "second", "third"] {
            state = attach(state, UnitId(1), Effect::debuff(name, name, UnitId(0)).turn_end(2))
                .expect("attach");
        }
        let state = cleanse(state, UnitId(1), 2).expect("cleanse");
        let left: Vec<_> = unit(&state, 1).effects.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(left, vec!["first"]);
    }

    #[test]
    fn dispel_skips_shields_and_tied_buffs() {
        let state = create_test_state();
        let state = attach(state, UnitId(1), atk_buff("plain")).expect("attach");
        let shield = Effect::buff("shield", "Shield", UnitId(0))
            .with_kind(crate::state::EffectKind::Shield { value: 100.0 });
        let state = attach(state, UnitId(1), shield).expect("attach shield");
        let tied = Effect::buff("tied", "Tied", UnitId(0)).tied_to(UnitId(1), "plain");
        let state = attach(state, UnitId(1), tied).expect("attach tied");

        let state = dispel(state, UnitId(1), 5).expect("dispel");
        let left: Vec<_> = unit(&state, 1).effects.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(left, vec!["shield"]);
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<&'static str>>,
    }

    impl EffectHooks for Recorder {
        fn on_attach(&self, state: WorldState, _: UnitId, _: &Effect) -> Result<WorldState> {
            self.seen.lock().expect("lock").push("attach");
            Ok(state)
        }

        fn on_detach(&self, state: WorldState, _: UnitId, _: &Effect) -> Result<WorldState> {
            self.seen.lock().expect("lock").push("detach");
            Ok(state)
        }

        fn on_event(
            &self,
            _: &Event,
            mut state: WorldState,
            owner: UnitId,
            effect: &Effect,
        ) -> Result<WorldState> {
            self.seen.lock().expect("lock").push("event");
            let hits = effect.local("hits") + 1.0;
            if let Some(attached) = state
                .unit_mut(owner)
                .and_then(|unit| unit.effect_mut(&effect.id))
            {
                attached.locals.insert("hits".into(), hits);
            }
            Ok(state)
        }
    }

    #[test]
    fn subscriptions_live_exactly_as_long_as_the_effect() {
        let recorder = Arc::new(Recorder::default());
        let effect = Effect::buff("listener", "Listener", UnitId(0))
            .subscribe(EventKind::TurnStart)
            .with_hooks(recorder.clone());
        let state = attach(create_test_state(), UnitId(1), effect).expect("attach");
        let state = crate::event::publish(state, &Event::TurnStart { unit: UnitId(1) })
            .expect("publish");
        assert_eq!(
            unit(&state, 1).effects[0].local("hits"),
            1.0,
            "effect-local state persists on the record"
        );
        let state = detach(state, UnitId(1), &EffectId::new("listener")).expect("detach");
        let state = crate::event::publish(state, &Event::TurnStart { unit: UnitId(1) })
            .expect("publish");
        assert!(state.handlers.is_empty());
        assert_eq!(
            *recorder.seen.lock().expect("lock"),
            vec!["attach", "event", "detach"]
        );
    }

    #[test]
    fn attach_publishes_effect_applied() {
        let state = register(
            create_test_state(),
            HandlerRegistration::new("watch", [EventKind::EffectApplied], |event, mut state, _| {
                if let Event::EffectApplied { target, .. } = event {
                    state.set_counter(*target, "applied", 1.0);
                }
                Ok(state)
            }),
        );
        let state = attach(state, UnitId(2), atk_buff("buff")).expect("attach");
        assert_eq!(unit(&state, 2).counter("applied"), 1.0);
    }

    #[test]
    fn crowd_control_reads_the_capability_flag() {
        let state = create_test_state();
        let stun = Effect::debuff("stun", "Stun", UnitId(0))
            .turn_start(1)
            .with_caps(EffectCaps::CROWD_CONTROL);
        let state = attach(state, UnitId(1), stun).expect("attach");
        assert!(is_crowd_controlled(unit(&state, 1)));
        assert!(!is_crowd_controlled(unit(&state, 0)));
    }
}
