//! Weakness-break statuses and engine-built debuffs.
//!
//! | Element   | Status       | Payload                                         |
//! |-----------|--------------|-------------------------------------------------|
//! | Physical  | Bleed        | 16% max HP (7% elite), capped at 2×LC×toughness |
//! | Fire      | Burn         | 1×LC per turn                                   |
//! | Ice       | Freeze       | skip turn, 1×LC additional damage               |
//! | Lightning | Shock        | 2×LC per turn                                   |
//! | Wind      | Wind Shear   | 1×LC per stack, 1 stack (3 elite), max 5        |
//! | Quantum   | Entanglement | delay, 0.6×LC×toughness per stack at turn start |
//! | Imaginary | Imprisonment | delay, −10% SPD                                 |

use crate::config::BattleConfig;
use crate::damage::toughness_multiplier;
use crate::state::{
    BreakStatus, DotCalc, DotType, Effect, EffectCaps, EffectId, EffectKind, Unit,
};
use crate::stats::{Element, Modifier, StatKey};

const LC: f64 = BattleConfig::LEVEL_CONSTANT_80;

/// Max toughness above which an enemy counts as elite.
const ELITE_TOUGHNESS: f64 = 100.0;

fn is_elite(target: &Unit) -> bool {
    target.max_toughness > ELITE_TOUGHNESS
}

fn break_dot(source: &Unit, target: &Unit, dot_type: DotType, base_damage: f64) -> Effect {
    Effect::debuff(
        EffectId::scoped(dot_type.name(), source.id, target.id),
        dot_type.name(),
        source.id,
    )
    .turn_start(2)
    .with_kind(EffectKind::Dot {
        dot_type,
        calc: DotCalc::Fixed { base_damage },
    })
}

fn break_status(
    source: &Unit,
    id: EffectId,
    status: BreakStatus,
    turns: u32,
    delay: f64,
    damage_per_stack: f64,
) -> Effect {
    Effect::debuff(id, status.name(), source.id)
        .turn_start(turns)
        .with_caps(EffectCaps::CROWD_CONTROL)
        .with_kind(EffectKind::BreakStatus {
            status,
            delay,
            damage_per_stack,
        })
}

/// Status inflicted when `source` breaks `target`'s weakness.
pub fn break_effect(source: &Unit, target: &Unit) -> Effect {
    let break_effect = source.stat(StatKey::BreakEffect);
    let toughness = toughness_multiplier(target.max_toughness);
    match source.element {
        Element::Physical => {
            let fraction = if target.is_enemy() && is_elite(target) {
                0.07
            } else {
                0.16
            };
            let base = (target.max_hp() * fraction).min(2.0 * LC * toughness);
            break_dot(source, target, DotType::Bleed, base)
        }
        Element::Fire => break_dot(source, target, DotType::Burn, LC),
        Element::Lightning => break_dot(source, target, DotType::Shock, 2.0 * LC),
        Element::Wind => {
            let stacks = if is_elite(target) { 3 } else { 1 };
            break_dot(source, target, DotType::WindShear, LC).with_stacks(stacks, 5)
        }
        Element::Ice => freeze_effect(source, target, 1),
        Element::Quantum => break_status(
            source,
            EffectId::scoped("Entanglement", source.id, target.id),
            BreakStatus::Entanglement,
            1,
            BattleConfig::ENTANGLEMENT_BASE_DELAY * (1.0 + break_effect),
            0.6 * LC * toughness,
        )
        .with_stacks(1, 5),
        Element::Imaginary => break_status(
            source,
            EffectId::scoped("Imprisonment", source.id, target.id),
            BreakStatus::Imprisonment,
            1,
            BattleConfig::IMPRISONMENT_BASE_DELAY * (1.0 + break_effect),
            0.0,
        )
        .with_modifier(Modifier::add(StatKey::SpdPct, -0.10, "Imprisonment").fixed()),
    }
}

/// Freeze status. Only one freeze can sit on a unit at a time.
pub fn freeze_effect(source: &Unit, target: &Unit, turns: u32) -> Effect {
    break_status(
        source,
        EffectId::new(format!("freeze-{}", target.id.0)),
        BreakStatus::Freeze,
        turns,
        0.0,
        LC,
    )
}

/// Ability-sourced DoT scaling off the source's ATK.
pub fn dot_effect(source: &Unit, target: &Unit, dot_type: DotType, multiplier: f64, turns: u32) -> Effect {
    Effect::debuff(
        EffectId::scoped(dot_type.name(), source.id, target.id),
        dot_type.name(),
        source.id,
    )
    .turn_start(turns)
    .with_kind(EffectKind::Dot {
        dot_type,
        calc: DotCalc::Multiplier {
            stat: StatKey::Atk,
            multiplier,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Faction, UnitId};
    use crate::stats::{ElementSet, StatBlock};

    fn create_test_pair(element: Element, max_toughness: f64) -> (Unit, Unit) {
        let source = Unit::new(
            UnitId(0),
            "breaker",
            Faction::Ally,
            element,
            80,
            StatBlock::zeroed()
                .with(StatKey::Spd, 100.0)
                .with(StatKey::BreakEffect, 0.5),
        );
        let target = Unit::new(
            UnitId(9),
            "dummy",
            Faction::Enemy,
            Element::Physical,
            80,
            StatBlock::zeroed()
                .with(StatKey::Hp, 100_000.0)
                .with(StatKey::Spd, 100.0),
        )
        .with_toughness(max_toughness, ElementSet::all());
        (source, target)
    }

    #[test]
    fn ids_name_kind_source_and_target() {
        let (source, target) = create_test_pair(Element::Fire, 60.0);
        assert_eq!(break_effect(&source, &target).id.as_str(), "Burn-0-9");
        let (source, target) = create_test_pair(Element::Ice, 60.0);
        assert_eq!(break_effect(&source, &target).id.as_str(), "freeze-9");
    }

    #[test]
    fn bleed_is_capped_by_toughness() {
        let (source, target) = create_test_pair(Element::Physical, 60.0);
        let effect = break_effect(&source, &target);
        let cap = 2.0 * LC * (0.5 + 60.0 / 40.0);
        match effect.kind {
            EffectKind::Dot {
                calc: DotCalc::Fixed { base_damage },
                ..
            } => assert!((base_damage - cap.min(16_000.0)).abs() < 1e-6),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn elite_wind_shear_starts_with_three_stacks() {
        let (source, target) = create_test_pair(Element::Wind, 160.0);
        let effect = break_effect(&source, &target);
        assert_eq!((effect.stacks, effect.max_stacks), (3, 5));
    }

    #[test]
    fn delays_scale_with_break_effect() {
        let (source, target) = create_test_pair(Element::Quantum, 60.0);
        let effect = break_effect(&source, &target);
        assert!(effect.is_crowd_control());
        match effect.kind {
            EffectKind::BreakStatus { delay, .. } => assert!((delay - 0.3).abs() < 1e-9),
            other => panic!("unexpected kind {other:?}"),
        }
        let (source, target) = create_test_pair(Element::Imaginary, 60.0);
        let effect = break_effect(&source, &target);
        assert_eq!(effect.modifiers.len(), 1);
    }
}
