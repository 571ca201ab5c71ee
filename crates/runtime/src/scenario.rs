//! Scenario files.
//!
//! A scenario is the RON description of one battle: engine settings, the
//! party in slot order, the enemy roster and the content modules each unit
//! carries. Unit ids are assigned at load time, party first.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use combat_core::event;
use combat_core::{
    Abilities, ActorConfig, BattleConfig, Element, Faction, HandlerRegistration, Modifier,
    StatBlock, StatKey, UltStrategy, Unit, UnitFlags, UnitId, WorldState,
};

use crate::content::ContentRegistry;
use crate::error::{Result, RuntimeError};

/// Battle description loaded from a RON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    /// Engine settings; omitted fields keep their defaults.
    #[serde(default)]
    pub battle: BattleConfig,

    /// Party members in slot order. Handler order follows this list.
    pub party: Vec<UnitSpec>,

    pub enemies: Vec<UnitSpec>,
}

/// One combatant in a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub name: String,
    pub element: Element,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub tier: u32,
    /// Base stats; unset keys are zero.
    pub stats: BTreeMap<StatKey, f64>,
    #[serde(default)]
    pub gear: Vec<Modifier>,
    #[serde(default)]
    pub toughness: f64,
    #[serde(default)]
    pub weaknesses: Vec<Element>,
    #[serde(default)]
    pub abilities: Abilities,
    /// Rotation of `s`/`b` steps. Party members default to `"b"`.
    #[serde(default)]
    pub rotation: Option<String>,
    #[serde(default)]
    pub ult_strategy: UltStrategy,
    #[serde(default)]
    pub ult_cooldown: u32,
    #[serde(default)]
    pub untargetable: bool,
    #[serde(default)]
    pub debuff_immune: bool,
    /// Content ids resolved through the [`ContentRegistry`].
    #[serde(default)]
    pub content: Vec<String>,
}

fn default_level() -> u32 {
    80
}

impl UnitSpec {
    /// Build the engine unit for this spec.
    pub fn to_unit(&self, id: UnitId, faction: Faction) -> Unit {
        let base_stats = self
            .stats
            .iter()
            .fold(StatBlock::zeroed(), |block, (key, value)| block.with(*key, *value));

        let mut unit = Unit::new(
            id,
            self.name.clone(),
            faction,
            self.element,
            self.level,
            base_stats,
        )
        .with_gear(self.gear.clone())
        .with_tier(self.tier)
        .with_abilities(self.abilities.clone());

        if self.toughness > 0.0 {
            unit = unit.with_toughness(self.toughness, self.weaknesses.iter().copied().collect());
        }

        if faction == Faction::Ally {
            let rotation = self.rotation.as_deref().unwrap_or("b");
            unit = unit.with_actor(
                ActorConfig::new(rotation).with_ult_strategy(self.ult_strategy, self.ult_cooldown),
            );
        }

        let mut flags = UnitFlags::empty();
        flags.set(UnitFlags::UNTARGETABLE, self.untargetable);
        flags.set(UnitFlags::DEBUFF_IMMUNE, self.debuff_immune);
        unit.with_flags(flags)
    }
}

impl Scenario {
    pub fn new(name: impl Into<String>, battle: BattleConfig) -> Self {
        Self {
            name: name.into(),
            battle,
            party: Vec::new(),
            enemies: Vec::new(),
        }
    }

    /// Parse a scenario from RON text.
    pub fn from_ron(source: &str) -> std::result::Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }

    /// Load a scenario from a RON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| RuntimeError::ScenarioIo {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_ron(&content).map_err(|source| RuntimeError::ScenarioParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the initial battle state and register every content handler.
    ///
    /// All setup checks run before any handler is registered: roster
    /// validation, rotation and ability checks, then content ids. Handlers
    /// are registered in roster order, party first.
    pub fn create_initial_state(&self, registry: &ContentRegistry) -> Result<WorldState> {
        info!(
            target: "runtime::scenario",
            scenario = %self.name,
            party = self.party.len(),
            enemies = self.enemies.len(),
            "creating initial state"
        );

        let mut state = WorldState::new(self.battle.clone());
        let roster = self
            .party
            .iter()
            .map(|spec| (spec, Faction::Ally))
            .chain(self.enemies.iter().map(|spec| (spec, Faction::Enemy)));

        let mut registrations: Vec<HandlerRegistration> = Vec::new();
        for (index, (spec, faction)) in roster.enumerate() {
            let id = UnitId(index as u32);
            state.add_unit(spec.to_unit(id, faction))?;
            for content in &spec.content {
                registrations.push(registry.create(content, id, spec.level, spec.tier)?);
            }
        }
        state.validate()?;

        for registration in registrations {
            debug!(
                target: "runtime::scenario",
                handler = %registration.id,
                "registering content handler"
            );
            state = event::register(state, registration);
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{ConfigError, EventKind};

    const TEST_SCENARIO: &str = r#"
Scenario(
    name: "training",
    battle: (rounds: 3, seed: 7),
    party: [
        (
            name: "Striker",
            element: Fire,
            stats: { hp: 3000.0, atk: 1000.0, spd: 100.0, max_ep: 120.0 },
            rotation: Some("sb"),
            content: ["lc-test"],
        ),
    ],
    enemies: [
        (
            name: "Dummy",
            element: Ice,
            stats: { hp: 100000.0, spd: 80.0 },
            toughness: 60.0,
            weaknesses: [Fire, Ice],
        ),
    ],
)
"#;

    fn create_test_registry() -> ContentRegistry {
        ContentRegistry::new().with("lc-test", |unit: UnitId, _level: u32, _tier: u32| {
            HandlerRegistration::new(
                format!("lc-test@{unit}"),
                [EventKind::BattleStart],
                |_event, state, _id| Ok(state),
            )
        })
    }

    #[test]
    fn parses_partial_settings_with_defaults() {
        let scenario = Scenario::from_ron(TEST_SCENARIO).expect("valid scenario");

        assert_eq!(scenario.name, "training");
        assert_eq!(scenario.battle.rounds, 3);
        assert_eq!(scenario.battle.seed, 7);
        assert_eq!(
            scenario.battle.max_skill_points,
            BattleConfig::DEFAULT_MAX_SKILL_POINTS
        );
        assert_eq!(scenario.party[0].level, 80);
        assert_eq!(scenario.party[0].abilities, Abilities::default());
    }

    #[test]
    fn builds_roster_party_first() {
        let scenario = Scenario::from_ron(TEST_SCENARIO).expect("valid scenario");
        let state = scenario
            .create_initial_state(&create_test_registry())
            .expect("valid roster");

        let striker = state.unit(UnitId(0)).expect("party member");
        assert_eq!(striker.name, "Striker");
        assert_eq!(striker.faction, Faction::Ally);
        assert_eq!(striker.stat(StatKey::Atk), 1000.0);
        assert_eq!(
            striker.actor.as_ref().map(|actor| actor.rotation.clone()),
            Some(vec!['s', 'b'])
        );

        let dummy = state.unit(UnitId(1)).expect("enemy");
        assert_eq!(dummy.faction, Faction::Enemy);
        assert_eq!(dummy.toughness, 60.0);
        assert!(dummy.weaknesses.has(Element::Fire));
        assert!(dummy.actor.is_none());

        assert!(state.handlers.contains(&"lc-test@#0".into()));
    }

    #[test]
    fn unknown_content_fails_before_registration() {
        let scenario = Scenario::from_ron(TEST_SCENARIO).expect("valid scenario");

        let err = scenario
            .create_initial_state(&ContentRegistry::new())
            .expect_err("content is not registered");
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::UnknownContent { unit: UnitId(0), .. })
        ));
    }

    #[test]
    fn invalid_rotation_is_rejected() {
        let mut scenario = Scenario::from_ron(TEST_SCENARIO).expect("valid scenario");
        scenario.party[0].rotation = Some("sx".to_string());

        let err = scenario
            .create_initial_state(&create_test_registry())
            .expect_err("bad rotation step");
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::InvalidRotationStep { step: 'x', .. })
        ));
    }

    #[test]
    fn empty_enemy_roster_is_rejected() {
        let mut scenario = Scenario::from_ron(TEST_SCENARIO).expect("valid scenario");
        scenario.enemies.clear();

        let err = scenario
            .create_initial_state(&create_test_registry())
            .expect_err("no enemies");
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::EmptyEnemies)
        ));
    }
}
