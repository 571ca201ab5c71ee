use std::collections::BTreeMap;

use super::UnitId;

/// How a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    Victory,
    Defeat,
    Timeout,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::Victory => "victory",
            Outcome::Defeat => "defeat",
            Outcome::Timeout => "timeout",
        }
    }
}

/// Aggregate battle statistics accumulated while the battle runs.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleResult {
    pub total_damage: f64,
    pub damage_by_unit: BTreeMap<UnitId, f64>,
    pub healing_by_unit: BTreeMap<UnitId, f64>,
    pub shield_by_unit: BTreeMap<UnitId, f64>,
    pub turns: usize,
    pub outcome: Option<Outcome>,
}

impl BattleResult {
    pub fn record_damage(&mut self, source: UnitId, amount: f64) {
        self.total_damage += amount;
        *self.damage_by_unit.entry(source).or_default() += amount;
    }

    pub fn record_healing(&mut self, source: UnitId, amount: f64) {
        *self.healing_by_unit.entry(source).or_default() += amount;
    }

    pub fn record_shield(&mut self, source: UnitId, amount: f64) {
        *self.shield_by_unit.entry(source).or_default() += amount;
    }

    pub fn damage_of(&self, unit: UnitId) -> f64 {
        self.damage_by_unit.get(&unit).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_accumulates_per_source_and_total() {
        let mut result = BattleResult::default();
        result.record_damage(UnitId(1), 100.0);
        result.record_damage(UnitId(2), 50.0);
        result.record_damage(UnitId(1), 25.0);
        assert_eq!(result.total_damage, 175.0);
        assert_eq!(result.damage_of(UnitId(1)), 125.0);
        assert_eq!(result.damage_of(UnitId(9)), 0.0);
    }
}
