//! Authoritative battle state representation.
//!
//! [`WorldState`] is the single root value threaded through every engine
//! operation. Operations take it by value and return the next version, so a
//! previous version can never be observed once it has been replaced.
mod ability;
mod effect;
mod ids;
mod log;
mod result;
mod unit;

use std::collections::{BTreeMap, VecDeque};

pub use ability::{
    Abilities, Ability, AbilityEffect, AbilityEffectKind, ActionKind, DamageShape, DamageSpec,
    EffectTarget, HealSpec, ShieldSpec, TargetType, ToughnessSpec,
};
pub use effect::{
    BreakStatus, DotCalc, DotType, DurationPolicy, Effect, EffectCaps, EffectCategory,
    EffectHooks, EffectKind,
};
pub use ids::{EffectId, HandlerId, UnitId};
pub use log::{ActionLog, EffectSnapshot, LogEntry, UnitSnapshot};
pub use result::{BattleResult, Outcome};
pub use unit::{ActorConfig, Faction, UltStrategy, Unit, UnitFlags};

use crate::aura::Aura;
use crate::config::BattleConfig;
use crate::damage::DamageModifiers;
use crate::effects::TieIndex;
use crate::error::ConfigError;
use crate::event::HandlerRegistry;
use crate::rng::RollSource;
use crate::schedule::ActionQueue;

/// An action waiting to be resolved after the current one (follow-ups,
/// counters, extra turns).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingAction {
    pub actor: UnitId,
    pub kind: ActionKind,
    pub target: Option<UnitId>,
}

impl PendingAction {
    pub fn new(actor: UnitId, kind: ActionKind, target: Option<UnitId>) -> Self {
        Self {
            actor,
            kind,
            target,
        }
    }
}

/// Canonical snapshot of the battle.
#[derive(Clone, Debug)]
pub struct WorldState {
    pub config: BattleConfig,
    /// Roster order: party first, then enemies. Summons sit right after
    /// their owner.
    pub units: Vec<Unit>,
    /// Active auras in registration order.
    pub auras: Vec<Aura>,
    pub queue: ActionQueue,
    pub pending: VecDeque<PendingAction>,
    pub handlers: HandlerRegistry,
    pub log: ActionLog,
    /// Elapsed action value since the battle started.
    pub time: f64,
    pub skill_points: i32,
    /// One-shot bonuses written by `BeforeDamageCalculation` handlers.
    pub damage_modifiers: DamageModifiers,
    pub ties: TieIndex,
    pub cooldowns: BTreeMap<HandlerId, u32>,
    pub current_turn_owner: Option<UnitId>,
    pub result: BattleResult,
    pub rng: RollSource,
}

impl WorldState {
    pub fn new(config: BattleConfig) -> Self {
        Self {
            rng: RollSource::seeded(config.seed),
            skill_points: config.initial_skill_points,
            config,
            units: Vec::new(),
            auras: Vec::new(),
            queue: ActionQueue::default(),
            pending: VecDeque::new(),
            handlers: HandlerRegistry::default(),
            log: ActionLog::default(),
            time: 0.0,
            damage_modifiers: DamageModifiers::default(),
            ties: TieIndex::default(),
            cooldowns: BTreeMap::new(),
            current_turn_owner: None,
            result: BattleResult::default(),
        }
    }

    /// Replace the random source (tests inject fixed oracles here).
    #[must_use]
    pub fn with_rng(mut self, rng: RollSource) -> Self {
        self.rng = rng;
        self
    }

    /// Validate and insert a unit. Allies start with a fraction of their max
    /// energy.
    pub fn add_unit(&mut self, mut unit: Unit) -> Result<(), ConfigError> {
        if self.unit(unit.id).is_some() {
            return Err(ConfigError::DuplicateUnit(unit.id));
        }
        if unit.speed() <= 0.0 {
            return Err(ConfigError::NonPositiveSpeed { unit: unit.id });
        }
        if let Some(actor) = &unit.actor {
            actor.validate(unit.id)?;
        }
        unit.abilities.validate(unit.id)?;
        if !unit.is_enemy() {
            unit.ep = unit.max_ep() * self.config.initial_energy_ratio;
        }
        self.units.push(unit);
        Ok(())
    }

    pub fn with_unit(mut self, unit: Unit) -> Result<Self, ConfigError> {
        self.add_unit(unit)?;
        Ok(self)
    }

    /// Setup checks that need the full roster.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.config.rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if !self.units.iter().any(|unit| !unit.is_enemy() && !unit.is_summon()) {
            return Err(ConfigError::EmptyParty);
        }
        if !self.units.iter().any(Unit::is_enemy) {
            return Err(ConfigError::EmptyEnemies);
        }
        Ok(())
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|unit| unit.id == id)
    }

    /// Living allies (characters and summons) in roster order.
    pub fn living_allies(&self) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(|unit| !unit.is_enemy() && unit.is_alive())
    }

    /// Living enemies in roster order.
    pub fn living_enemies(&self) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(|unit| unit.is_enemy() && unit.is_alive())
    }

    /// Living units on the opposite side of `unit`.
    pub fn opponents_of(&self, unit: UnitId) -> Vec<UnitId> {
        let enemy = self.unit(unit).is_some_and(Unit::is_enemy);
        self.units
            .iter()
            .filter(|other| other.is_enemy() != enemy && other.is_alive())
            .map(|other| other.id)
            .collect()
    }

    /// Living units on the same side as `unit`, itself included.
    pub fn teammates_of(&self, unit: UnitId) -> Vec<UnitId> {
        let enemy = self.unit(unit).is_some_and(Unit::is_enemy);
        self.units
            .iter()
            .filter(|other| other.is_enemy() == enemy && other.is_alive())
            .map(|other| other.id)
            .collect()
    }

    /// One past the highest id in use, for summons.
    pub fn next_unit_id(&self) -> UnitId {
        UnitId(
            self.units
                .iter()
                .map(|unit| unit.id.0 + 1)
                .max()
                .unwrap_or(0),
        )
    }

    pub fn gain_skill_points(&mut self, amount: i32) {
        self.skill_points = (self.skill_points + amount).min(self.config.max_skill_points);
    }

    pub fn spend_skill_points(&mut self, amount: i32) {
        self.skill_points = (self.skill_points - amount).max(0);
    }

    pub fn set_counter(&mut self, unit: UnitId, key: impl Into<String>, value: f64) {
        if let Some(target) = self.unit_mut(unit) {
            target.counters.insert(key.into(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Element, StatBlock, StatKey};

    fn create_test_unit(id: u32, faction: Faction) -> Unit {
        Unit::new(
            UnitId(id),
            format!("unit-{id}"),
            faction,
            Element::Physical,
            80,
            StatBlock::zeroed()
                .with(StatKey::Hp, 1000.0)
                .with(StatKey::Spd, 100.0)
                .with(StatKey::MaxEp, 120.0),
        )
    }

    #[test]
    fn allies_start_with_half_energy() {
        let state = WorldState::new(BattleConfig::default())
            .with_unit(create_test_unit(0, Faction::Ally))
            .and_then(|state| state.with_unit(create_test_unit(1, Faction::Enemy)))
            .expect("valid roster");
        assert_eq!(state.unit(UnitId(0)).map(|unit| unit.ep), Some(60.0));
        assert_eq!(state.unit(UnitId(1)).map(|unit| unit.ep), Some(0.0));
    }

    #[test]
    fn duplicate_units_are_rejected() {
        let mut state = WorldState::new(BattleConfig::default());
        assert!(state.add_unit(create_test_unit(0, Faction::Ally)).is_ok());
        assert_eq!(
            state.add_unit(create_test_unit(0, Faction::Enemy)),
            Err(ConfigError::DuplicateUnit(UnitId(0)))
        );
    }

    #[test]
    fn non_positive_speed_is_rejected() {
        let mut state = WorldState::new(BattleConfig::default());
        let mut unit = create_test_unit(0, Faction::Ally);
        unit.base_stats.set(StatKey::Spd, 0.0);
        unit.recalculate_stats();
        assert_eq!(
            state.add_unit(unit),
            Err(ConfigError::NonPositiveSpeed { unit: UnitId(0) })
        );
    }

    #[test]
    fn roster_validation_requires_both_sides() {
        let mut state = WorldState::new(BattleConfig::default());
        assert_eq!(state.validate(), Err(ConfigError::EmptyParty));
        assert!(state.add_unit(create_test_unit(0, Faction::Ally)).is_ok());
        assert_eq!(state.validate(), Err(ConfigError::EmptyEnemies));
        assert!(state.add_unit(create_test_unit(1, Faction::Enemy)).is_ok());
        assert_eq!(state.validate(), Ok(()));
    }

    #[test]
    fn skill_points_are_capped() {
        let mut state = WorldState::new(BattleConfig::default());
        state.gain_skill_points(10);
        assert_eq!(state.skill_points, 5);
        state.spend_skill_points(7);
        assert_eq!(state.skill_points, 0);
    }
}
