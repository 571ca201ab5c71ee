use strum::{EnumCount, IntoEnumIterator};

use super::StatKey;

/// Dense stat block indexed by [`StatKey`].
///
/// Unset stats read as zero.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatBlock {
    values: Vec<f64>,
}

impl StatBlock {
    pub fn zeroed() -> Self {
        Self {
            values: vec![0.0; StatKey::COUNT],
        }
    }

    #[inline]
    pub fn get(&self, key: StatKey) -> f64 {
        self.values.get(key.index()).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, key: StatKey, value: f64) {
        if let Some(slot) = self.values.get_mut(key.index()) {
            *slot = value;
        }
    }

    pub fn add(&mut self, key: StatKey, delta: f64) {
        if let Some(slot) = self.values.get_mut(key.index()) {
            *slot += delta;
        }
    }

    #[must_use]
    pub fn with(mut self, key: StatKey, value: f64) -> Self {
        self.set(key, value);
        self
    }

    /// Non-zero entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (StatKey, f64)> + '_ {
        StatKey::iter()
            .map(|key| (key, self.get(key)))
            .filter(|(_, value)| *value != 0.0)
    }
}

impl Default for StatBlock {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl FromIterator<(StatKey, f64)> for StatBlock {
    fn from_iter<I: IntoIterator<Item = (StatKey, f64)>>(iter: I) -> Self {
        let mut block = Self::zeroed();
        for (key, value) in iter {
            block.set(key, value);
        }
        block
    }
}
