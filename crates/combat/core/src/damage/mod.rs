//! Damage, healing and shielding calculation.
//!
//! Every function here is pure: it reads units and returns a number. Callers
//! (the action resolver and content handlers) apply the result to the world
//! state. Crit rolls happen in the caller, which passes the outcome in, so the
//! same inputs always produce the same output.

mod calculator;
mod multipliers;
mod support;

pub use calculator::{
    additional_damage, break_additional_damage, break_damage, direct_damage, dot_damage,
    super_break_damage,
};
pub use multipliers::{
    break_level_multiplier, broken_multiplier, crit_chance, crit_multiplier,
    damage_boost_multiplier, defense_multiplier, mitigation, resistance_multiplier,
    toughness_multiplier, vulnerability_multiplier,
};
pub use support::{
    debuff_hit_chance, effect_hit_chance, energy_gain, heal_amount, shield_amount,
    toughness_reduction,
};

/// Which pipeline produced a damage instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageKind {
    /// Ability hit.
    Direct,
    /// Weakness-break burst.
    Break,
    SuperBreak,
    Dot,
    /// Freeze and entanglement payloads.
    BreakAdditional,
    Additional,
    /// Bypasses every multiplier.
    True,
}

impl DamageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            DamageKind::Direct => "direct",
            DamageKind::Break => "break",
            DamageKind::SuperBreak => "super_break",
            DamageKind::Dot => "dot",
            DamageKind::BreakAdditional => "break_additional",
            DamageKind::Additional => "additional",
            DamageKind::True => "true",
        }
    }

    /// Whether the instance can crit.
    pub const fn can_crit(self) -> bool {
        matches!(self, DamageKind::Direct | DamageKind::Additional)
    }
}

/// One-shot bonuses for the next damage calculation.
///
/// `BeforeDamageCalculation` handlers write into `WorldState::damage_modifiers`;
/// the resolver reads them for exactly one hit and then calls [`reset`].
///
/// [`reset`]: DamageModifiers::reset
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageModifiers {
    /// Multiplies the scaling stat: `stat × (1 + atk_boost)`.
    pub atk_boost: f64,
    /// Flat damage added to the base.
    pub base_dmg_add: f64,
    pub crit_rate: f64,
    pub crit_dmg: f64,
    pub dmg_boost: f64,
    pub def_ignore: f64,
    pub res_pen: f64,
    pub break_efficiency: f64,
}

impl DamageModifiers {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_every_field() {
        let mut modifiers = DamageModifiers {
            atk_boost: 0.2,
            crit_dmg: 0.5,
            res_pen: 0.1,
            ..Default::default()
        };
        assert!(!modifiers.is_empty());
        modifiers.reset();
        assert!(modifiers.is_empty());
    }

    #[test]
    fn only_hits_and_additional_damage_crit() {
        assert!(DamageKind::Direct.can_crit());
        assert!(DamageKind::Additional.can_crit());
        assert!(!DamageKind::Dot.can_crit());
        assert!(!DamageKind::Break.can_crit());
        assert!(!DamageKind::True.can_crit());
    }
}
