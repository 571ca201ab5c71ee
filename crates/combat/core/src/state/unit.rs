use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::config::BattleConfig;
use crate::error::ConfigError;
use crate::stats::{Element, ElementSet, Modifier, StatBlock, StatKey, resolve_stats};

use super::{Abilities, Effect, EffectId, EffectKind, UnitId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Faction {
    Ally,
    Enemy,
}

bitflags! {
    /// Per-unit engine flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct UnitFlags: u8 {
        /// Debuffs attached to this unit are ignored.
        const DEBUFF_IMMUNE = 1 << 0;
        /// Enemies never pick this unit as a target.
        const UNTARGETABLE = 1 << 1;
        /// Summoned pet; acts with its skill.
        const SUMMON = 1 << 2;
    }
}

/// When a character fires its ultimate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UltStrategy {
    /// Interrupt the timeline as soon as energy is full.
    #[default]
    Immediate,
    /// Use it as the turn's action once energy is full and the cooldown is over.
    Cooldown,
}

/// Player-side decision making for a character.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorConfig {
    /// Cyclic rotation of `s` (skill) and `b` (basic).
    pub rotation: Vec<char>,
    pub ult_strategy: UltStrategy,
    /// Turns to wait between ultimates under [`UltStrategy::Cooldown`].
    pub ult_cooldown: u32,
}

impl ActorConfig {
    pub fn new(rotation: &str) -> Self {
        Self {
            rotation: rotation.chars().collect(),
            ult_strategy: UltStrategy::Immediate,
            ult_cooldown: 0,
        }
    }

    #[must_use]
    pub fn with_ult_strategy(mut self, strategy: UltStrategy, cooldown: u32) -> Self {
        self.ult_strategy = strategy;
        self.ult_cooldown = cooldown;
        self
    }

    pub fn step(&self, index: usize) -> Option<char> {
        if self.rotation.is_empty() {
            return None;
        }
        self.rotation.get(index % self.rotation.len()).copied()
    }

    pub fn validate(&self, unit: UnitId) -> Result<(), ConfigError> {
        if self.rotation.is_empty() {
            return Err(ConfigError::EmptyRotation { unit });
        }
        match self.rotation.iter().find(|step| !matches!(step, 's' | 'b')) {
            Some(step) => Err(ConfigError::InvalidRotationStep { unit, step: *step }),
            None => Ok(()),
        }
    }
}

/// A combatant: player character, enemy or summon.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub faction: Faction,
    pub element: Element,
    pub level: u32,
    /// Upgrade tier handed to content factories.
    pub tier: u32,
    pub base_stats: StatBlock,
    stats: StatBlock,
    /// Permanent gear modifiers.
    pub gear: Vec<Modifier>,
    /// Modifiers projected onto this unit by living aura sources. Kept in
    /// step with the aura list by [`crate::aura::refresh`].
    #[cfg_attr(feature = "serde", serde(default))]
    pub aura_modifiers: Vec<Modifier>,
    pub hp: f64,
    /// Sum of all attached shield values.
    pub shield: f64,
    pub ep: f64,
    pub toughness: f64,
    pub max_toughness: f64,
    pub weaknesses: ElementSet,
    pub effects: Vec<Effect>,
    pub action_value: f64,
    /// Gauge progress towards the next turn.
    pub action_point: f64,
    pub rotation_index: usize,
    pub ult_cooldown: u32,
    pub actor: Option<ActorConfig>,
    pub abilities: Abilities,
    pub flags: UnitFlags,
    /// Per-unit scratch counters owned by content modules.
    pub counters: BTreeMap<String, f64>,
    /// Owner of a summon.
    pub summoner: Option<UnitId>,
}

impl Unit {
    pub fn new(
        id: UnitId,
        name: impl Into<String>,
        faction: Faction,
        element: Element,
        level: u32,
        base_stats: StatBlock,
    ) -> Self {
        let mut unit = Self {
            id,
            name: name.into(),
            faction,
            element,
            level,
            tier: 0,
            stats: StatBlock::zeroed(),
            base_stats,
            gear: Vec::new(),
            aura_modifiers: Vec::new(),
            hp: 0.0,
            shield: 0.0,
            ep: 0.0,
            toughness: 0.0,
            max_toughness: 0.0,
            weaknesses: ElementSet::empty(),
            effects: Vec::new(),
            action_value: BattleConfig::BASE_ACTION_VALUE,
            action_point: 0.0,
            rotation_index: 0,
            ult_cooldown: 0,
            actor: None,
            abilities: Abilities::default(),
            flags: UnitFlags::empty(),
            counters: BTreeMap::new(),
            summoner: None,
        };
        unit.recalculate_stats();
        unit.hp = unit.max_hp();
        unit.action_value = crate::schedule::action_value(unit.speed());
        unit
    }

    #[must_use]
    pub fn with_gear(mut self, gear: Vec<Modifier>) -> Self {
        self.gear = gear;
        self.recalculate_stats();
        self.hp = self.max_hp();
        self.action_value = crate::schedule::action_value(self.speed());
        self
    }

    #[must_use]
    pub fn with_toughness(mut self, max_toughness: f64, weaknesses: ElementSet) -> Self {
        self.max_toughness = max_toughness;
        self.toughness = max_toughness;
        self.weaknesses = weaknesses;
        self
    }

    #[must_use]
    pub fn with_abilities(mut self, abilities: Abilities) -> Self {
        self.abilities = abilities;
        self
    }

    #[must_use]
    pub fn with_actor(mut self, actor: ActorConfig) -> Self {
        self.actor = Some(actor);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: UnitFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_tier(mut self, tier: u32) -> Self {
        self.tier = tier;
        self
    }

    /// Effective stats, always the output of the stat resolver.
    #[inline]
    pub fn stats(&self) -> &StatBlock {
        &self.stats
    }

    #[inline]
    pub fn stat(&self, key: StatKey) -> f64 {
        self.stats.get(key)
    }

    /// Rebuild the effective stat block from base stats, gear, auras and
    /// effects.
    pub fn recalculate_stats(&mut self) {
        let aura_modifiers = self.aura_modifiers.iter().map(|modifier| (modifier, 1));
        let effect_modifiers = self.effects.iter().flat_map(|effect| {
            effect
                .modifiers
                .iter()
                .map(move |modifier| (modifier, effect.stacks))
        });
        self.stats = resolve_stats(
            &self.base_stats,
            &self.gear,
            aura_modifiers.chain(effect_modifiers),
        );
        if self.hp > self.max_hp() {
            self.hp = self.max_hp();
        }
    }

    pub fn max_hp(&self) -> f64 {
        self.stats.get(StatKey::Hp)
    }

    pub fn max_ep(&self) -> f64 {
        self.stats.get(StatKey::MaxEp)
    }

    pub fn speed(&self) -> f64 {
        self.stats.get(StatKey::Spd)
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn is_enemy(&self) -> bool {
        self.faction == Faction::Enemy
    }

    pub fn is_summon_of(&self, owner: UnitId) -> bool {
        self.is_summon() && self.summoner == Some(owner)
    }

    pub fn is_summon(&self) -> bool {
        self.flags.contains(UnitFlags::SUMMON)
    }

    pub fn is_targetable(&self) -> bool {
        self.is_alive() && !self.flags.contains(UnitFlags::UNTARGETABLE)
    }

    pub fn is_broken(&self) -> bool {
        self.max_toughness > 0.0 && self.toughness <= 0.0
    }

    pub fn effect(&self, id: &EffectId) -> Option<&Effect> {
        self.effects.iter().find(|effect| &effect.id == id)
    }

    pub fn effect_mut(&mut self, id: &EffectId) -> Option<&mut Effect> {
        self.effects.iter_mut().find(|effect| &effect.id == id)
    }

    pub fn has_effect(&self, id: &EffectId) -> bool {
        self.effect(id).is_some()
    }

    pub fn counter(&self, key: &str) -> f64 {
        self.counters.get(key).copied().unwrap_or(0.0)
    }

    /// Recompute `shield` as the sum of attached shield effects.
    pub fn sync_shield(&mut self) {
        self.shield = self
            .effects
            .iter()
            .map(|effect| match effect.kind {
                EffectKind::Shield { value } => value,
                _ => 0.0,
            })
            .sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_unit() -> Unit {
        Unit::new(
            UnitId(1),
            "Tester",
            Faction::Ally,
            Element::Fire,
            80,
            StatBlock::zeroed()
                .with(StatKey::Hp, 1000.0)
                .with(StatKey::Atk, 500.0)
                .with(StatKey::Spd, 100.0),
        )
    }

    #[test]
    fn new_unit_starts_at_full_hp_and_base_action_value() {
        let unit = create_test_unit();
        assert_eq!(unit.hp, 1000.0);
        assert_eq!(unit.action_value, 100.0);
    }

    #[test]
    fn recalculation_clamps_hp_to_new_max() {
        let mut unit = create_test_unit().with_gear(vec![Modifier::pct(
            StatKey::HpPct,
            0.5,
            "gear",
        )]);
        assert_eq!(unit.hp, 1500.0);
        unit.gear.clear();
        unit.recalculate_stats();
        assert_eq!(unit.hp, 1000.0);
    }

    #[test]
    fn rotation_validation_rejects_unknown_steps() {
        assert!(ActorConfig::new("sbb").validate(UnitId(1)).is_ok());
        assert_eq!(
            ActorConfig::new("sx").validate(UnitId(1)),
            Err(ConfigError::InvalidRotationStep {
                unit: UnitId(1),
                step: 'x'
            })
        );
        assert_eq!(
            ActorConfig::new("").validate(UnitId(1)),
            Err(ConfigError::EmptyRotation { unit: UnitId(1) })
        );
    }

    #[test]
    fn rotation_steps_cycle() {
        let actor = ActorConfig::new("sb");
        assert_eq!(actor.step(0), Some('s'));
        assert_eq!(actor.step(3), Some('b'));
    }
}
