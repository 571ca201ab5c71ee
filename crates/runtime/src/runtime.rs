//! High-level runtime orchestrator.
//!
//! The runtime turns a scenario plus a content registry into a ready battle,
//! runs it through the engine and summarises the result as a
//! [`BattleReport`].

use std::env;

use serde::{Deserialize, Serialize};
use tracing::info;

use combat_core::simulation;
use combat_core::{
    Faction, LogEntry, Outcome, RollSource, UnitId, WorldState, compute_log_digest,
};

use crate::content::ContentRegistry;
use crate::error::{Result, RuntimeError};
use crate::scenario::Scenario;

/// Runtime configuration applied on top of the scenario settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Replaces the scenario seed.
    pub seed: Option<u64>,
    /// Replaces the scenario round budget.
    pub rounds: Option<u32>,
    /// Embed the full action log in the report.
    pub include_log: bool,
}

impl RuntimeConfig {
    /// Read overrides from `COMBAT_SEED`, `COMBAT_ROUNDS` and
    /// `COMBAT_INCLUDE_LOG`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.seed = read_env::<u64>("COMBAT_SEED");
        config.rounds = read_env::<u32>("COMBAT_ROUNDS");

        if let Some(include) = read_env::<bool>("COMBAT_INCLUDE_LOG") {
            config.include_log = include;
        } else if env::var("COMBAT_INCLUDE_LOG").is_ok() {
            config.include_log = true;
        }

        config
    }

    fn apply(&self, mut state: WorldState) -> WorldState {
        if let Some(seed) = self.seed {
            state.config.seed = seed;
            state.rng = RollSource::seeded(seed);
        }
        if let Some(rounds) = self.rounds {
            state.config.rounds = rounds;
        }
        state
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

/// A battle ready to run.
#[derive(Debug)]
pub struct Runtime {
    name: String,
    config: RuntimeConfig,
    state: WorldState,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Initial state, before `BattleStart` is published.
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Run the battle to completion and summarise it.
    pub fn run(self) -> Result<BattleReport> {
        let state = simulation::run(self.state)?;
        let report = BattleReport::from_state(self.name, &state, self.config.include_log);

        info!(
            target: "runtime",
            scenario = %report.scenario,
            outcome = report.outcome.map_or("none", Outcome::as_str),
            turns = report.turns,
            total_damage = report.total_damage,
            digest = %report.digest,
            "battle report ready"
        );
        Ok(report)
    }
}

/// Builder for [`Runtime`].
#[derive(Debug, Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    scenario: Option<Scenario>,
    state: Option<WorldState>,
    content: ContentRegistry,
    rng: Option<RollSource>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Scenario to build the battle from.
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(scenario);
        self
    }

    /// Use a prepared state instead of a scenario. Handlers must already be
    /// registered on it.
    pub fn initial_state(mut self, state: WorldState) -> Self {
        self.state = Some(state);
        self
    }

    /// Content factories referenced by the scenario.
    pub fn content(mut self, content: ContentRegistry) -> Self {
        self.content = content;
        self
    }

    /// Replace the seeded random source (tests inject fixed oracles here).
    pub fn rng(mut self, rng: RollSource) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Validate the setup and produce a runnable battle.
    ///
    /// A scenario takes precedence over an initial state.
    pub fn build(self) -> Result<Runtime> {
        let (name, state) = match (self.scenario, self.state) {
            (Some(scenario), _) => {
                let state = scenario.create_initial_state(&self.content)?;
                (scenario.name, state)
            }
            (None, Some(state)) => (String::from("custom"), state),
            (None, None) => return Err(RuntimeError::MissingScenario),
        };

        let mut state = self.config.apply(state);
        if let Some(rng) = self.rng {
            state = state.with_rng(rng);
        }
        state.validate()?;

        Ok(Runtime {
            name,
            config: self.config,
            state,
        })
    }
}

/// Per-unit totals in the report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitReport {
    pub id: UnitId,
    pub name: String,
    pub faction: Faction,
    pub alive: bool,
    pub hp: f64,
    pub damage_dealt: f64,
    pub healing_dealt: f64,
    pub shield_provided: f64,
}

/// Serializable summary of a finished battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub scenario: String,
    pub outcome: Option<Outcome>,
    pub turns: usize,
    /// Elapsed action value.
    pub time: f64,
    pub total_damage: f64,
    pub units: Vec<UnitReport>,
    pub log_entries: usize,
    /// Hex SHA-256 over the action log; equal seeds give equal digests.
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<Vec<LogEntry>>,
}

impl BattleReport {
    pub fn from_state(scenario: String, state: &WorldState, include_log: bool) -> Self {
        let result = &state.result;
        let units = state
            .units
            .iter()
            .map(|unit| UnitReport {
                id: unit.id,
                name: unit.name.clone(),
                faction: unit.faction,
                alive: unit.is_alive(),
                hp: unit.hp,
                damage_dealt: result.damage_of(unit.id),
                healing_dealt: result.healing_by_unit.get(&unit.id).copied().unwrap_or(0.0),
                shield_provided: result.shield_by_unit.get(&unit.id).copied().unwrap_or(0.0),
            })
            .collect();

        Self {
            scenario,
            outcome: result.outcome,
            turns: result.turns,
            time: state.time,
            total_damage: result.total_damage,
            units,
            log_entries: state.log.len(),
            digest: hex::encode(compute_log_digest(&state.log)),
            log: include_log.then(|| state.log.entries().to_vec()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(RuntimeError::Report)
    }

    pub fn unit(&self, id: UnitId) -> Option<&UnitReport> {
        self.units.iter().find(|unit| unit.id == id)
    }
}
