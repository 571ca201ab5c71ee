//! Healing, shielding, toughness, energy and effect-hit chance.

use crate::state::{AbilityEffect, AbilityEffectKind, HealSpec, ShieldSpec, Unit};
use crate::stats::StatKey;

use super::DamageModifiers;

/// # Formula
/// ```text
/// (stat × multiplier + flat) × (1 + outgoing_heal(source) + incoming_heal(target))
/// ```
pub fn heal_amount(source: &Unit, target: &Unit, spec: &HealSpec) -> f64 {
    let base = source.stat(spec.scaling) * spec.multiplier + spec.flat;
    let boost = 1.0
        + source.stat(StatKey::OutgoingHealingBoost)
        + target.stat(StatKey::IncomingHealBoost);
    (base * boost).max(0.0)
}

/// Shield value, capped when the spec declares a cap.
///
/// # Formula
/// ```text
/// min((stat × multiplier + flat) × (1 + shield_strength_boost), cap)
/// ```
pub fn shield_amount(source: &Unit, spec: &ShieldSpec) -> f64 {
    let base = source.stat(spec.scaling) * spec.multiplier + spec.flat;
    let value = (base * (1.0 + source.stat(StatKey::ShieldStrengthBoost))).max(0.0);
    match spec.cap {
        Some(cap) => value.min(cap),
        None => value,
    }
}

/// Toughness removed by one hit.
///
/// # Formula
/// ```text
/// base × (1 + break_efficiency_boost + dynamic)
/// ```
pub fn toughness_reduction(source: &Unit, base: f64, modifiers: &DamageModifiers) -> f64 {
    base * (1.0 + source.stat(StatKey::BreakEfficiencyBoost) + modifiers.break_efficiency)
}

/// Energy gained before the `max_ep` cap.
///
/// # Formula
/// ```text
/// base × (1 + energy_regen_rate) + flat
/// ```
pub fn energy_gain(unit: &Unit, base: f64, flat: f64) -> f64 {
    base * (1.0 + unit.stat(StatKey::EnergyRegenRate)) + flat
}

/// Chance for a debuff to land.
///
/// # Formula
/// ```text
/// base × (1 + EHR) × (1 − RES) × (1 − cc_res if crowd control) × (1 − specific_res)
/// ```
pub fn debuff_hit_chance(
    source: &Unit,
    target: &Unit,
    base: f64,
    specific_res: Option<StatKey>,
    crowd_control: bool,
) -> f64 {
    let crowd_control_mult = if crowd_control {
        1.0 - target.stat(StatKey::CrowdControlRes)
    } else {
        1.0
    };
    let specific_mult = specific_res.map_or(1.0, |key| 1.0 - target.stat(key));
    let chance = base
        * (1.0 + source.stat(StatKey::EffectHitRate))
        * (1.0 - target.stat(StatKey::EffectRes))
        * crowd_control_mult
        * specific_mult;
    chance.clamp(0.0, 1.0)
}

/// Chance for an ability effect to land on `target`. Buffs and effects that
/// ignore resistance use the base chance.
pub fn effect_hit_chance(source: &Unit, target: &Unit, effect: &AbilityEffect) -> f64 {
    if effect.kind.is_buff() || effect.ignore_resistance {
        return effect.base_chance.clamp(0.0, 1.0);
    }
    let (specific_res, crowd_control) = match &effect.kind {
        AbilityEffectKind::Freeze { .. } => (Some(StatKey::FrozenRes), true),
        AbilityEffectKind::Dot { dot_type, .. } => (Some(dot_type.resistance()), false),
        _ => (None, false),
    };
    debuff_hit_chance(source, target, effect.base_chance, specific_res, crowd_control)
}
