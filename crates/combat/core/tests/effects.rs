//! Effect lifecycle: ties, purges, stacking, durations and stat purity.

use combat_core::effects::{self, attach, cleanse, detach, dispel, tick_turn_end};
use combat_core::{
    BattleConfig, Effect, EffectId, EngineError, Faction, Modifier, StatBlock, StatKey, Unit,
    UnitId, WorldState,
};
use combat_core::{Element, ElementSet};

fn create_test_state() -> WorldState {
    let ally = Unit::new(
        UnitId(0),
        "ally",
        Faction::Ally,
        Element::Wind,
        80,
        StatBlock::zeroed()
            .with(StatKey::Hp, 3000.0)
            .with(StatKey::Atk, 1000.0)
            .with(StatKey::Spd, 100.0),
    );
    let enemy = Unit::new(
        UnitId(1),
        "enemy",
        Faction::Enemy,
        Element::Physical,
        80,
        StatBlock::zeroed()
            .with(StatKey::Hp, 50_000.0)
            .with(StatKey::Spd, 90.0),
    )
    .with_toughness(60.0, ElementSet::all());

    WorldState::new(BattleConfig::default())
        .with_unit(ally)
        .and_then(|state| state.with_unit(enemy))
        .expect("valid roster")
}

fn effect_ids(state: &WorldState, unit: u32) -> Vec<String> {
    state
        .unit(UnitId(unit))
        .expect("unit")
        .effects
        .iter()
        .map(|effect| effect.id.as_str().to_string())
        .collect()
}

#[test]
fn detaching_a_parent_cascades_through_tied_effects() {
    let state = create_test_state();
    let state = attach(state, UnitId(0), Effect::buff("field", "Field", UnitId(0))).expect("parent");
    let state = attach(
        state,
        UnitId(1),
        Effect::debuff("field-mark", "Field Mark", UnitId(0)).tied_to(UnitId(0), "field"),
    )
    .expect("child");
    let state = attach(
        state,
        UnitId(1),
        Effect::debuff("field-echo", "Field Echo", UnitId(0)).tied_to(UnitId(1), "field-mark"),
    )
    .expect("grandchild");
    assert_eq!(effect_ids(&state, 1), vec!["field-mark", "field-echo"]);

    let state = detach(state, UnitId(0), &EffectId::new("field")).expect("detach");
    assert!(effect_ids(&state, 0).is_empty());
    assert!(effect_ids(&state, 1).is_empty());
    assert!(state.ties.is_empty());
}

#[test]
fn tying_to_a_missing_parent_is_an_invariant_violation() {
    let state = create_test_state();

    let err = attach(
        state,
        UnitId(1),
        Effect::debuff("orphan", "Orphan", UnitId(0)).tied_to(UnitId(0), "nothing"),
    )
    .expect_err("no parent");
    assert!(matches!(err, EngineError::DanglingTie { .. }));
}

#[test]
fn cleanse_removes_latest_debuffs_first() {
    let mut state = create_test_state();
    for name in ["first", "second", "third"] {
        state = attach(state, UnitId(0), Effect::debuff(name, name, UnitId(1)).turn_end(3))
            .expect("debuff");
    }

    let state = cleanse(state, UnitId(0), 2).expect("cleanse");
    assert_eq!(effect_ids(&state, 0), vec!["first"]);
}

#[test]
fn dispel_skips_shields_and_debuffs() {
    let state = create_test_state();
    let state = attach(state, UnitId(1), Effect::debuff("weaken", "Weaken", UnitId(0)))
        .expect("debuff");
    let state = attach(state, UnitId(1), Effect::buff("rage", "Rage", UnitId(1))).expect("buff");
    let state = combat_core::resolver::apply_shield(
        state,
        UnitId(1),
        UnitId(1),
        combat_core::ShieldGrant::new("Carapace", 500.0, 2),
    )
    .expect("shield");

    let state = dispel(state, UnitId(1), 5).expect("dispel");
    let remaining = effect_ids(&state, 1);
    assert!(remaining.contains(&"weaken".to_string()));
    assert!(!remaining.contains(&"rage".to_string()));
    assert_eq!(state.unit(UnitId(1)).expect("enemy").shield, 500.0);
}

#[test]
fn reapplying_from_the_same_source_adds_a_stack() {
    let buff = || {
        Effect::buff("momentum", "Momentum", UnitId(0))
            .turn_end(2)
            .with_stacks(1, 3)
            .with_modifier(Modifier::add(StatKey::Atk, 100.0, "Momentum"))
    };
    let mut state = create_test_state();
    for _ in 0..4 {
        state = attach(state, UnitId(0), buff()).expect("attach");
    }

    let ally = state.unit(UnitId(0)).expect("ally");
    let momentum = ally.effect(&EffectId::new("momentum")).expect("attached");
    assert_eq!(momentum.stacks, 3);
    assert_eq!(ally.stat(StatKey::Atk), 1300.0);
}

#[test]
fn invalid_stack_counts_are_rejected() {
    let state = create_test_state();

    let err = attach(
        state,
        UnitId(0),
        Effect::buff("broken", "Broken", UnitId(0)).with_stacks(4, 3),
    )
    .expect_err("stacks above cap");
    assert!(matches!(err, EngineError::InvalidStackCount { stacks: 4, .. }));
}

#[test]
fn self_applied_buff_survives_its_first_turn_end() {
    let mut state = create_test_state();
    state.current_turn_owner = Some(UnitId(0));
    let state = attach(
        state,
        UnitId(0),
        Effect::buff("focus", "Focus", UnitId(0))
            .turn_end(1)
            .skip_first_turn_decrement(),
    )
    .expect("attach");

    let state = tick_turn_end(state, UnitId(0)).expect("first turn end");
    let focus = state
        .unit(UnitId(0))
        .and_then(|ally| ally.effect(&EffectId::new("focus")))
        .expect("still attached");
    assert_eq!(focus.remaining, 1);

    let state = tick_turn_end(state, UnitId(0)).expect("second turn end");
    assert!(effect_ids(&state, 0).is_empty());
}

#[test]
fn attach_then_detach_restores_effective_stats() {
    let state = create_test_state();
    let before = state.unit(UnitId(0)).expect("ally").stats().clone();

    let state = attach(
        state,
        UnitId(0),
        Effect::buff("haste", "Haste", UnitId(0))
            .with_modifier(Modifier::pct(StatKey::Spd, 0.1, "Haste"))
            .with_modifier(Modifier::add(StatKey::CritRate, 0.12, "Haste")),
    )
    .expect("attach");
    assert_ne!(state.unit(UnitId(0)).expect("ally").stats(), &before);

    let state = detach(state, UnitId(0), &EffectId::new("haste")).expect("detach");
    assert_eq!(state.unit(UnitId(0)).expect("ally").stats(), &before);
}

#[test]
fn debuff_immune_units_ignore_debuffs() {
    let mut state = create_test_state();
    if let Some(enemy) = state.unit_mut(UnitId(1)) {
        enemy.flags |= combat_core::UnitFlags::DEBUFF_IMMUNE;
    }

    let state = attach(state, UnitId(1), Effect::debuff("slow", "Slow", UnitId(0)))
        .expect("no-op");
    assert!(effect_ids(&state, 1).is_empty());
    assert!(!effects::is_crowd_controlled(state.unit(UnitId(1)).expect("enemy")));
}
