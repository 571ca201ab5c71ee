//! Effective stat computation following the layered stack architecture.
//!
//! Every contribution lands in one of three layers:
//! Base → Pct → Add
//!
//! The core stats (HP, ATK, DEF, SPD) are composed multiplicatively; every
//! other stat is the plain sum of its layers.

use strum::IntoEnumIterator;

use super::{Modifier, ModifierKind, StatBlock, StatKey};

/// The three accumulation layers of a stat computation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatLayers {
    base: StatBlock,
    pct: StatBlock,
    add: StatBlock,
}

impl StatLayers {
    /// Start from a unit's base stat block.
    pub fn from_base(base: &StatBlock) -> Self {
        Self {
            base: base.clone(),
            pct: StatBlock::zeroed(),
            add: StatBlock::zeroed(),
        }
    }

    /// Fold one modifier into its layer, scaled by `stacks`.
    ///
    /// Non-base modifiers on a `_pct` key go to the percentage layer, all
    /// others to the flat layer.
    pub fn push(&mut self, modifier: &Modifier, stacks: u32) {
        let value = modifier.scaled_value(stacks);
        match modifier.kind {
            ModifierKind::Base => self.base.add(modifier.stat, value),
            ModifierKind::Pct | ModifierKind::Add if modifier.stat.is_percent() => {
                self.pct.add(modifier.stat, value)
            }
            ModifierKind::Pct | ModifierKind::Add => self.add.add(modifier.stat, value),
        }
    }

    /// Collapse the layers into the effective stat block.
    ///
    /// # Formula
    /// ```text
    /// hp/atk/def/spd = base × (1 + pct[stat_pct]) + add
    /// other          = base + pct + add
    /// ```
    pub fn compose(&self) -> StatBlock {
        let mut out = StatBlock::zeroed();
        for key in StatKey::iter() {
            let value = match key.percent_companion() {
                Some(companion) => {
                    let pct = self.base.get(companion) + self.pct.get(companion);
                    self.base.get(key) * (1.0 + pct) + self.add.get(key)
                }
                None => self.base.get(key) + self.pct.get(key) + self.add.get(key),
            };
            out.set(key, value);
        }
        out
    }
}

/// Recompute an effective stat block from scratch.
///
/// `effect_modifiers` yields each active effect or aura modifier together
/// with the stack count it applies at (auras always apply once). The result depends only on the
/// inputs, so computing it twice yields bit-identical blocks.
pub fn resolve_stats<'a>(
    base: &StatBlock,
    gear: &[Modifier],
    effect_modifiers: impl IntoIterator<Item = (&'a Modifier, u32)>,
) -> StatBlock {
    let mut layers = StatLayers::from_base(base);
    for modifier in gear {
        layers.push(modifier, 1);
    }
    for (modifier, stacks) in effect_modifiers {
        layers.push(modifier, stacks);
    }
    layers.compose()
}
