//! Shared multiplicative terms of the damage pipeline.

use crate::config::BattleConfig;
use crate::state::{ActionKind, Unit};
use crate::stats::{Element, StatKey};

use super::DamageModifiers;

// ============================================================================
// Level Tables
// ============================================================================

/// Break base damage milestones by attacker level.
const BREAK_LEVEL_TABLE: [(u32, f64); 8] = [
    (1, 54.0),
    (20, 100.0),
    (30, 231.0),
    (40, 502.0),
    (50, 774.0),
    (60, 1640.0),
    (70, 2660.0),
    (80, BattleConfig::LEVEL_CONSTANT_80),
];

/// Level-indexed break base damage, linearly interpolated between milestones
/// and clamped to the table ends.
pub fn break_level_multiplier(level: u32) -> f64 {
    let (first_level, first_value) = BREAK_LEVEL_TABLE[0];
    if level <= first_level {
        return first_value;
    }
    for window in BREAK_LEVEL_TABLE.windows(2) {
        let (low_level, low_value) = window[0];
        let (high_level, high_value) = window[1];
        if level <= high_level {
            let t = f64::from(level - low_level) / f64::from(high_level - low_level);
            return low_value + (high_value - low_value) * t;
        }
    }
    BattleConfig::LEVEL_CONSTANT_80
}

/// Toughness pool size multiplier.
///
/// # Formula
/// ```text
/// 0.5 + max_toughness / 40
/// ```
pub fn toughness_multiplier(max_toughness: f64) -> f64 {
    0.5 + max_toughness / 40.0
}

// ============================================================================
// Multipliers
// ============================================================================

/// Crit chance capped at 100%.
pub fn crit_chance(source: &Unit, modifiers: &DamageModifiers) -> f64 {
    (source.stat(StatKey::CritRate) + modifiers.crit_rate).clamp(0.0, 1.0)
}

/// `1 + crit_dmg` on a crit, `1` otherwise.
pub fn crit_multiplier(source: &Unit, modifiers: &DamageModifiers, is_crit: bool) -> f64 {
    if is_crit {
        1.0 + source.stat(StatKey::CritDmg) + modifiers.crit_dmg
    } else {
        1.0
    }
}

/// # Formula
/// ```text
/// 1 + elemental + action_type + all_type − all_dmg_dealt_reduction + dynamic
/// ```
pub fn damage_boost_multiplier(
    source: &Unit,
    element: Element,
    action: Option<ActionKind>,
    modifiers: &DamageModifiers,
) -> f64 {
    let action_boost = action.map_or(0.0, |kind| source.stat(kind.dmg_boost()));
    1.0 + source.stat(StatKey::dmg_boost(element))
        + action_boost
        + source.stat(StatKey::AllTypeDmgBoost)
        - source.stat(StatKey::AllDmgDealtReduction)
        + modifiers.dmg_boost
}

/// # Formula
/// ```text
/// (Ls + 20) / ((Lt + 20) × (1 − def_reduction) × (1 − def_ignore) + Ls + 20)
/// ```
pub fn defense_multiplier(source: &Unit, target: &Unit, modifiers: &DamageModifiers) -> f64 {
    let source_term = f64::from(source.level) + 20.0;
    let target_term = f64::from(target.level) + 20.0;
    let def_reduction = target.stat(StatKey::DefReduction);
    let def_ignore = source.stat(StatKey::DefIgnore) + modifiers.def_ignore;
    source_term / (target_term * (1.0 - def_reduction) * (1.0 - def_ignore) + source_term)
}

/// # Formula
/// ```text
/// 1 − (res − (elemental_pen + all_type_pen))
/// ```
pub fn resistance_multiplier(
    source: &Unit,
    target: &Unit,
    element: Element,
    modifiers: &DamageModifiers,
) -> f64 {
    let penetration = source.stat(StatKey::res_pen(element))
        + source.stat(StatKey::AllTypeResPen)
        + modifiers.res_pen;
    1.0 - (target.stat(StatKey::res(element)) - penetration)
}

/// # Formula
/// ```text
/// 1 + all_type_vuln + elemental_vuln − dmg_taken_reduction
/// ```
pub fn vulnerability_multiplier(target: &Unit, element: Element) -> f64 {
    1.0 + target.stat(StatKey::AllTypeVuln) + target.stat(StatKey::vuln(element))
        - target.stat(StatKey::DmgTakenReduction)
}

/// 0.9 while the target has toughness left, 1.0 once broken.
pub fn broken_multiplier(target: &Unit) -> f64 {
    if target.toughness > 0.0 { 0.9 } else { 1.0 }
}

/// `def × res × vuln × broken`, the tail shared by every damage family.
pub fn mitigation(
    source: &Unit,
    target: &Unit,
    element: Element,
    modifiers: &DamageModifiers,
) -> f64 {
    defense_multiplier(source, target, modifiers)
        * resistance_multiplier(source, target, element, modifiers)
        * vulnerability_multiplier(target, element)
        * broken_multiplier(target)
}
