/// Battle configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// Number of rounds to simulate before declaring a timeout.
    pub rounds: u32,
    /// Skill point pool ceiling shared by the party.
    pub max_skill_points: i32,
    /// Skill points available when the battle starts.
    pub initial_skill_points: i32,
    /// Fraction of max energy every ally starts with.
    pub initial_energy_ratio: f64,
    /// Seed for the shared random source.
    pub seed: u64,
}

impl BattleConfig {
    // ===== engine constants =====
    /// Turn length in gauge units; a unit with speed `s` acts every `10000 / s` ticks.
    pub const BASE_ACTION_VALUE: f64 = 10_000.0;
    /// Hard cap on simulation steps, independent of the round budget.
    pub const MAX_TURNS: usize = 500;
    /// Pending actions drained after a single dispatch before giving up.
    pub const MAX_PENDING_ACTIONS: usize = 100;
    /// Immediate ultimates resolved in one interrupt window.
    pub const MAX_ULTIMATE_CHAIN: usize = 10;
    /// Upper bound of hits generated by one ability use.
    pub const MAX_HITS_PER_ACTION: usize = 16;
    /// Action value that corresponds to one round.
    pub const ROUND_LENGTH: f64 = 100.0;
    /// Extra time granted on top of the round budget (the first round is 150).
    pub const FIRST_ROUND_BONUS: f64 = 50.0;

    // ===== numeric tables =====
    /// Break base damage at level 80.
    pub const LEVEL_CONSTANT_80: f64 = 3767.5533;
    /// Energy granted to the unit that lands a killing blow.
    pub const ENEMY_DEFEAT_ENERGY_REWARD: f64 = 10.0;
    /// Action advance granted when freeze wears off.
    pub const FREEZE_REMOVAL_ADVANCE: f64 = 0.5;
    /// Base gauge delay applied by entanglement (scaled by break effect).
    pub const ENTANGLEMENT_BASE_DELAY: f64 = 0.2;
    /// Base gauge delay applied by imprisonment (scaled by break effect).
    pub const IMPRISONMENT_BASE_DELAY: f64 = 0.3;
    /// Aggro used for target selection when a unit has none.
    pub const DEFAULT_AGGRO: f64 = 100.0;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_ROUNDS: u32 = 5;
    pub const DEFAULT_MAX_SKILL_POINTS: i32 = 5;
    pub const DEFAULT_INITIAL_SKILL_POINTS: i32 = 3;
    pub const DEFAULT_INITIAL_ENERGY_RATIO: f64 = 0.5;

    pub fn new() -> Self {
        Self {
            rounds: Self::DEFAULT_ROUNDS,
            max_skill_points: Self::DEFAULT_MAX_SKILL_POINTS,
            initial_skill_points: Self::DEFAULT_INITIAL_SKILL_POINTS,
            initial_energy_ratio: Self::DEFAULT_INITIAL_ENERGY_RATIO,
            seed: 0,
        }
    }

    #[must_use]
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_skill_points(mut self, initial: i32, max: i32) -> Self {
        self.initial_skill_points = initial;
        self.max_skill_points = max;
        self
    }

    /// Elapsed action value at which the battle times out.
    pub fn time_limit(&self) -> f64 {
        f64::from(self.rounds) * Self::ROUND_LENGTH + Self::FIRST_ROUND_BONUS
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
