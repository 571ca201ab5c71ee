//! Ability definitions consumed by the action resolver.
//!
//! Abilities are data: targeting, damage shape, toughness damage, energy,
//! skill-point cost, healing, shielding and the effects they try to apply.
//! Conditional behaviour belongs to content-module handlers.

use crate::config::BattleConfig;
use crate::error::ConfigError;
use crate::stats::{Modifier, StatKey};

use super::{DotType, UnitId};

/// The four kinds of ability use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionKind {
    Basic,
    Skill,
    Ultimate,
    FollowUp,
}

impl ActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            ActionKind::Basic => "Basic ATK",
            ActionKind::Skill => "Skill",
            ActionKind::Ultimate => "Ultimate",
            ActionKind::FollowUp => "Follow-up",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ActionKind::Basic => "basic",
            ActionKind::Skill => "skill",
            ActionKind::Ultimate => "ultimate",
            ActionKind::FollowUp => "follow_up",
        }
    }

    /// Ability-type-specific damage boost stat.
    pub const fn dmg_boost(self) -> StatKey {
        match self {
            ActionKind::Basic => StatKey::BasicAtkDmgBoost,
            ActionKind::Skill => StatKey::SkillDmgBoost,
            ActionKind::Ultimate => StatKey::UltDmgBoost,
            ActionKind::FollowUp => StatKey::FuaDmgBoost,
        }
    }

    /// Toughness damage used when the ability declares none.
    pub const fn default_toughness(self) -> f64 {
        match self {
            ActionKind::Basic | ActionKind::FollowUp => 10.0,
            ActionKind::Skill => 20.0,
            ActionKind::Ultimate => 30.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetType {
    #[default]
    SingleEnemy,
    /// Main target plus its neighbours in the living-enemy list.
    Blast,
    /// One random living enemy per multiplier.
    Bounce,
    AllEnemies,
    Ally,
    AllAllies,
    SelfOnly,
}

impl TargetType {
    pub const fn is_offensive(self) -> bool {
        matches!(
            self,
            TargetType::SingleEnemy | TargetType::Blast | TargetType::Bounce | TargetType::AllEnemies
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageShape {
    Simple { multiplier: f64 },
    Blast { main: f64, adjacent: f64 },
    Bounce { multipliers: Vec<f64> },
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageSpec {
    pub scaling: StatKey,
    pub shape: DamageShape,
}

impl DamageSpec {
    pub fn simple(multiplier: f64) -> Self {
        Self {
            scaling: StatKey::Atk,
            shape: DamageShape::Simple { multiplier },
        }
    }

    pub fn blast(main: f64, adjacent: f64) -> Self {
        Self {
            scaling: StatKey::Atk,
            shape: DamageShape::Blast { main, adjacent },
        }
    }

    pub fn bounce(multipliers: Vec<f64>) -> Self {
        Self {
            scaling: StatKey::Atk,
            shape: DamageShape::Bounce { multipliers },
        }
    }

    #[must_use]
    pub fn scaling(mut self, stat: StatKey) -> Self {
        self.scaling = stat;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ToughnessSpec {
    /// Same value for every hit; adjacent blast hits take half.
    Scalar(f64),
    Blast { main: f64, adjacent: f64 },
}

impl ToughnessSpec {
    pub fn for_hit(self, adjacent: bool) -> f64 {
        match (self, adjacent) {
            (ToughnessSpec::Scalar(value), false) => value,
            (ToughnessSpec::Scalar(value), true) => value / 2.0,
            (ToughnessSpec::Blast { main, .. }, false) => main,
            (ToughnessSpec::Blast { adjacent, .. }, true) => adjacent,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealSpec {
    pub scaling: StatKey,
    pub multiplier: f64,
    pub flat: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShieldSpec {
    pub scaling: StatKey,
    pub multiplier: f64,
    pub flat: f64,
    pub duration: u32,
    pub cap: Option<f64>,
    /// Add to an existing shield of the same name from the same source.
    pub stackable: bool,
}

/// What an ability tries to apply after its hits resolve.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityEffectKind {
    Buff {
        name: String,
        modifiers: Vec<Modifier>,
        duration: u32,
        max_stacks: u32,
    },
    Debuff {
        name: String,
        modifiers: Vec<Modifier>,
        duration: u32,
        max_stacks: u32,
    },
    Freeze {
        duration: u32,
    },
    Dot {
        dot_type: DotType,
        multiplier: f64,
        duration: u32,
    },
    Cleanse {
        count: usize,
    },
    Dispel {
        count: usize,
    },
}

impl AbilityEffectKind {
    /// Stacks cap declared by the effect, if it has one.
    pub fn max_stacks(&self) -> Option<u32> {
        match self {
            AbilityEffectKind::Buff { max_stacks, .. }
            | AbilityEffectKind::Debuff { max_stacks, .. } => Some(*max_stacks),
            _ => None,
        }
    }

    pub fn is_buff(&self) -> bool {
        matches!(
            self,
            AbilityEffectKind::Buff { .. } | AbilityEffectKind::Cleanse { .. }
        )
    }
}

/// Who an ability effect lands on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectTarget {
    /// The units the ability targeted.
    #[default]
    Targets,
    SelfOnly,
    AllEnemies,
    AllAllies,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityEffect {
    pub kind: AbilityEffectKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: EffectTarget,
    pub base_chance: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ignore_resistance: bool,
}

impl AbilityEffect {
    pub fn new(kind: AbilityEffectKind) -> Self {
        Self {
            kind,
            target: EffectTarget::Targets,
            base_chance: 1.0,
            ignore_resistance: false,
        }
    }

    #[must_use]
    pub fn on(mut self, target: EffectTarget) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_chance(mut self, base_chance: f64) -> Self {
        self.base_chance = base_chance;
        self
    }

    #[must_use]
    pub fn ignoring_resistance(mut self) -> Self {
        self.ignore_resistance = true;
        self
    }
}

/// Static definition of a single ability.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ability {
    pub name: String,
    pub target: TargetType,
    pub damage: Option<DamageSpec>,
    pub toughness: Option<ToughnessSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub energy_gain: f64,
    /// Skill points consumed by a skill; defaults to one.
    pub sp_cost: Option<i32>,
    pub heal: Option<HealSpec>,
    pub shield: Option<ShieldSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<AbilityEffect>,
}

impl Ability {
    pub fn new(name: impl Into<String>, target: TargetType) -> Self {
        Self {
            name: name.into(),
            target,
            damage: None,
            toughness: None,
            energy_gain: 0.0,
            sp_cost: None,
            heal: None,
            shield: None,
            effects: Vec::new(),
        }
    }

    /// Single-target basic attack at 100% ATK that grants 20 energy.
    pub fn basic_attack() -> Self {
        Self::new("Basic ATK", TargetType::SingleEnemy)
            .with_damage(DamageSpec::simple(1.0))
            .with_energy(20.0)
    }

    #[must_use]
    pub fn with_damage(mut self, damage: DamageSpec) -> Self {
        self.damage = Some(damage);
        self
    }

    #[must_use]
    pub fn with_toughness(mut self, toughness: ToughnessSpec) -> Self {
        self.toughness = Some(toughness);
        self
    }

    #[must_use]
    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy_gain = energy;
        self
    }

    #[must_use]
    pub fn with_sp_cost(mut self, cost: i32) -> Self {
        self.sp_cost = Some(cost);
        self
    }

    #[must_use]
    pub fn with_heal(mut self, heal: HealSpec) -> Self {
        self.heal = Some(heal);
        self
    }

    #[must_use]
    pub fn with_shield(mut self, shield: ShieldSpec) -> Self {
        self.shield = Some(shield);
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: AbilityEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Toughness damage of one hit, falling back to the kind's default.
    pub fn toughness_for_hit(&self, kind: ActionKind, adjacent: bool) -> f64 {
        self.toughness
            .unwrap_or(ToughnessSpec::Scalar(kind.default_toughness()))
            .for_hit(adjacent)
    }

    fn validate(&self, unit: UnitId, slot: &'static str) -> Result<(), ConfigError> {
        if self
            .effects
            .iter()
            .any(|effect| effect.kind.max_stacks() == Some(0))
        {
            return Err(ConfigError::InvalidMaxStacks {
                unit,
                ability: slot,
            });
        }
        let bounce_hits = match &self.damage {
            Some(DamageSpec {
                shape: DamageShape::Bounce { multipliers },
                ..
            }) => multipliers.len(),
            _ => 0,
        };
        if bounce_hits > BattleConfig::MAX_HITS_PER_ACTION {
            return Err(ConfigError::TooManyHits {
                unit,
                ability: slot,
                max: BattleConfig::MAX_HITS_PER_ACTION,
            });
        }
        Ok(())
    }
}

/// The ability kit of a unit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Abilities {
    pub basic: Ability,
    pub skill: Option<Ability>,
    pub ultimate: Option<Ability>,
    /// Ability used for follow-up attacks.
    pub talent: Option<Ability>,
}

impl Abilities {
    pub fn get(&self, kind: ActionKind) -> Option<&Ability> {
        match kind {
            ActionKind::Basic => Some(&self.basic),
            ActionKind::Skill => self.skill.as_ref(),
            ActionKind::Ultimate => self.ultimate.as_ref(),
            ActionKind::FollowUp => self.talent.as_ref(),
        }
    }

    pub fn validate(&self, unit: UnitId) -> Result<(), ConfigError> {
        self.basic.validate(unit, "basic")?;
        if let Some(skill) = &self.skill {
            skill.validate(unit, "skill")?;
        }
        if let Some(ultimate) = &self.ultimate {
            ultimate.validate(unit, "ultimate")?;
        }
        if let Some(talent) = &self.talent {
            talent.validate(unit, "talent")?;
        }
        Ok(())
    }
}

impl Default for Abilities {
    fn default() -> Self {
        Self {
            basic: Ability::basic_attack(),
            skill: None,
            ultimate: None,
            talent: None,
        }
    }
}
