use std::collections::BTreeMap;

use crate::state::{EffectId, UnitId};

/// `(owner, effect)` address of an attached effect.
pub type EffectRef = (UnitId, EffectId);

/// Adjacency index of tied lifetimes: parent → dependents in attach order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TieIndex {
    dependents: BTreeMap<EffectRef, Vec<EffectRef>>,
}

impl TieIndex {
    pub fn link(&mut self, parent: EffectRef, child: EffectRef) {
        let children = self.dependents.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// Forget a single parent → child edge.
    pub fn unlink(&mut self, parent: &EffectRef, child: &EffectRef) {
        if let Some(children) = self.dependents.get_mut(parent) {
            children.retain(|entry| entry != child);
            if children.is_empty() {
                self.dependents.remove(parent);
            }
        }
    }

    /// Remove and return every dependent of `parent`.
    pub fn take_dependents(&mut self, parent: &EffectRef) -> Vec<EffectRef> {
        self.dependents.remove(parent).unwrap_or_default()
    }

    pub fn dependents(&self, parent: &EffectRef) -> &[EffectRef] {
        self.dependents
            .get(parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}
