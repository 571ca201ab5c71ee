//! The four damage families.

use crate::state::{ActionKind, DotCalc, DotType, Unit};
use crate::stats::{Element, StatKey};

use super::DamageModifiers;
use super::multipliers::{
    break_level_multiplier, crit_multiplier, damage_boost_multiplier, mitigation,
    toughness_multiplier,
};

// ============================================================================
// Direct Hits
// ============================================================================

/// Damage of one ability hit.
///
/// # Formula
/// ```text
/// base = stat × (1 + atk_boost) × multiplier + base_dmg_add
/// dmg  = base × crit × boost × def × res × vuln × broken
/// ```
///
/// # Arguments
///
/// * `scaling` - Source stat the multiplier applies to (usually ATK)
/// * `action` - Ability type, selects the action-specific damage boost
/// * `is_crit` - Outcome of the caller's crit roll
pub fn direct_damage(
    source: &Unit,
    target: &Unit,
    scaling: StatKey,
    multiplier: f64,
    action: ActionKind,
    modifiers: &DamageModifiers,
    is_crit: bool,
) -> f64 {
    let base = source.stat(scaling) * (1.0 + modifiers.atk_boost) * multiplier
        + modifiers.base_dmg_add;
    let element = source.element;
    base * crit_multiplier(source, modifiers, is_crit)
        * damage_boost_multiplier(source, element, Some(action), modifiers)
        * mitigation(source, target, element, modifiers)
}

// ============================================================================
// Weakness Break
// ============================================================================

/// Burst dealt the moment a target's toughness is depleted. Never crits.
///
/// # Formula
/// ```text
/// level(L) × element_coeff × (1 + BE) × (0.5 + maxT / 40) × def × res × vuln × broken
/// ```
pub fn break_damage(source: &Unit, target: &Unit, modifiers: &DamageModifiers) -> f64 {
    let element = source.element;
    break_level_multiplier(source.level)
        * element.break_coefficient()
        * (1.0 + source.stat(StatKey::BreakEffect))
        * toughness_multiplier(target.max_toughness)
        * mitigation(source, target, element, modifiers)
}

/// Super break dealt to an already-broken target. Zero without a super break
/// boost.
///
/// # Formula
/// ```text
/// level(L) × (toughness_reduced / 10) × sb_boost × (1 + BE) × def × res × vuln × broken
/// ```
pub fn super_break_damage(
    source: &Unit,
    target: &Unit,
    toughness_reduced: f64,
    modifiers: &DamageModifiers,
) -> f64 {
    let boost = source.stat(StatKey::SuperBreakDmgBoost);
    if boost <= 0.0 {
        return 0.0;
    }
    break_level_multiplier(source.level)
        * (toughness_reduced / 10.0)
        * boost
        * (1.0 + source.stat(StatKey::BreakEffect))
        * mitigation(source, target, source.element, modifiers)
}

// ============================================================================
// Damage over Time
// ============================================================================

/// One DoT tick for `stacks` stacks. Never crits.
///
/// Break DoTs (fixed base) scale with break effect; ability DoTs (stat
/// multiplier) take the usual elemental and generic boosts.
///
/// # Formula
/// ```text
/// fixed:      base × stacks × (1 + BE) × (1 + dot_boost) × def × res × vuln × broken
/// multiplier: stat × mult × stacks × (1 + elem + all_type + dot_boost + dynamic)
///             × def × res × vuln × broken
/// ```
pub fn dot_damage(
    source: &Unit,
    target: &Unit,
    dot_type: DotType,
    calc: DotCalc,
    stacks: u32,
    modifiers: &DamageModifiers,
) -> f64 {
    let element = dot_type.element();
    let stacks = f64::from(stacks.max(1));
    let dot_boost = source.stat(StatKey::DotDmgBoost);
    let scaled = match calc {
        DotCalc::Fixed { base_damage } => {
            base_damage
                * stacks
                * (1.0 + source.stat(StatKey::BreakEffect))
                * (1.0 + dot_boost)
        }
        DotCalc::Multiplier { stat, multiplier } => {
            source.stat(stat)
                * multiplier
                * stacks
                * (1.0
                    + source.stat(StatKey::dmg_boost(element))
                    + source.stat(StatKey::AllTypeDmgBoost)
                    + dot_boost
                    + modifiers.dmg_boost)
        }
    };
    scaled * mitigation(source, target, element, modifiers)
}

// ============================================================================
// Additional Damage
// ============================================================================

/// Break-sourced additional damage (freeze, entanglement). Never crits.
///
/// # Formula
/// ```text
/// base × (1 + BE) × def × res × vuln × broken
/// ```
pub fn break_additional_damage(
    source: &Unit,
    target: &Unit,
    base: f64,
    element: Element,
    modifiers: &DamageModifiers,
) -> f64 {
    base * (1.0 + source.stat(StatKey::BreakEffect))
        * mitigation(source, target, element, modifiers)
}

/// Additional damage from talents and equipment. Takes the direct-hit
/// pipeline minus the action-type boost.
///
/// # Formula
/// ```text
/// base × crit × (1 + elem + all_type + dynamic) × def × res × vuln × broken
/// ```
pub fn additional_damage(
    source: &Unit,
    target: &Unit,
    base: f64,
    element: Element,
    modifiers: &DamageModifiers,
    is_crit: bool,
) -> f64 {
    let boost = 1.0
        + source.stat(StatKey::dmg_boost(element))
        + source.stat(StatKey::AllTypeDmgBoost)
        + modifiers.dmg_boost;
    base * crit_multiplier(source, modifiers, is_crit)
        * boost
        * mitigation(source, target, element, modifiers)
}
