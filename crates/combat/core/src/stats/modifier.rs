use super::StatKey;

/// Layer a modifier is folded into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierKind {
    /// Added to the base layer, before percentage scaling.
    Base,
    /// Percentage bonus (`0.1` = +10%).
    Pct,
    /// Flat bonus added after percentage scaling.
    Add,
}

/// How an effect modifier interacts with the effect's stack count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackScaling {
    #[default]
    PerStack,
    Fixed,
}

/// A single stat contribution from gear or an effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifier {
    pub stat: StatKey,
    pub kind: ModifierKind,
    pub value: f64,
    /// Human-readable origin ("Light Cone", "Relic 4pc", effect name).
    pub source: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scaling: StackScaling,
}

impl Modifier {
    pub fn new(stat: StatKey, kind: ModifierKind, value: f64, source: impl Into<String>) -> Self {
        Self {
            stat,
            kind,
            value,
            source: source.into(),
            scaling: StackScaling::PerStack,
        }
    }

    pub fn pct(stat: StatKey, value: f64, source: impl Into<String>) -> Self {
        Self::new(stat, ModifierKind::Pct, value, source)
    }

    pub fn add(stat: StatKey, value: f64, source: impl Into<String>) -> Self {
        Self::new(stat, ModifierKind::Add, value, source)
    }

    pub fn base(stat: StatKey, value: f64, source: impl Into<String>) -> Self {
        Self::new(stat, ModifierKind::Base, value, source)
    }

    /// Ignore the owning effect's stack count.
    #[must_use]
    pub fn fixed(mut self) -> Self {
        self.scaling = StackScaling::Fixed;
        self
    }

    /// Contribution of this modifier for an effect with `stacks` stacks.
    pub fn scaled_value(&self, stacks: u32) -> f64 {
        match self.scaling {
            StackScaling::PerStack => self.value * f64::from(stacks.max(1)),
            StackScaling::Fixed => self.value,
        }
    }
}
