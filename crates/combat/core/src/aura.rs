//! Auras: modifiers a unit projects onto a group while it is alive.
//!
//! Unlike effects, an aura is not attached to the units it reaches. It lives
//! in [`WorldState::auras`] and [`refresh`] folds it into every qualifying
//! unit's stats. An aura stops applying as soon as its source dies, and
//! defeat removes the source's auras for good.

use tracing::debug;

use crate::schedule;
use crate::state::{Unit, UnitId, WorldState};
use crate::stats::Modifier;

/// Who an aura reaches, relative to its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuraTarget {
    SelfOnly,
    /// The source's side, source included.
    AllAllies,
    /// The source's side, source excluded.
    OtherAllies,
    /// The opposite side.
    AllEnemies,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aura {
    pub id: String,
    pub name: String,
    pub source: UnitId,
    pub target: AuraTarget,
    pub modifiers: Vec<Modifier>,
}

impl Aura {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source: UnitId,
        target: AuraTarget,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source,
            target,
            modifiers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Whether this aura reaches `unit` while cast by `source`.
    pub fn reaches(&self, source: &Unit, unit: &Unit) -> bool {
        if !source.is_alive() {
            return false;
        }
        let same_side = source.is_enemy() == unit.is_enemy();
        match self.target {
            AuraTarget::SelfOnly => unit.id == source.id,
            AuraTarget::AllAllies => same_side,
            AuraTarget::OtherAllies => same_side && unit.id != source.id,
            AuraTarget::AllEnemies => !same_side,
        }
    }
}

/// Register an aura, replacing any aura with the same id.
pub fn add_aura(mut state: WorldState, aura: Aura) -> WorldState {
    debug!(
        target: "combat::effects",
        unit = %aura.source,
        aura = %aura.id,
        "aura added"
    );
    match state.auras.iter_mut().find(|existing| existing.id == aura.id) {
        Some(existing) => *existing = aura,
        None => state.auras.push(aura),
    }
    refresh(state)
}

pub fn remove_aura(mut state: WorldState, id: &str) -> WorldState {
    let before = state.auras.len();
    state.auras.retain(|aura| aura.id != id);
    if state.auras.len() == before {
        return state;
    }
    refresh(state)
}

/// Drop every aura cast by `source`. Called when the source is defeated.
pub fn remove_auras_by_source(mut state: WorldState, source: UnitId) -> WorldState {
    let before = state.auras.len();
    state.auras.retain(|aura| aura.source != source);
    if state.auras.len() == before {
        return state;
    }
    debug!(
        target: "combat::effects",
        unit = %source,
        removed = before - state.auras.len(),
        "auras removed with their source"
    );
    refresh(state)
}

/// Modifiers every living aura contributes to `unit`, in registration order.
pub fn modifiers_for(state: &WorldState, unit: UnitId) -> Vec<Modifier> {
    let Some(target) = state.unit(unit) else {
        return Vec::new();
    };
    state
        .auras
        .iter()
        .filter(|aura| {
            state
                .unit(aura.source)
                .is_some_and(|source| aura.reaches(source, target))
        })
        .flat_map(|aura| aura.modifiers.iter().cloned())
        .collect()
}

/// Names of the auras reaching `unit`, for log snapshots.
pub fn auras_on(state: &WorldState, unit: UnitId) -> Vec<&str> {
    let Some(target) = state.unit(unit) else {
        return Vec::new();
    };
    state
        .auras
        .iter()
        .filter(|aura| {
            state
                .unit(aura.source)
                .is_some_and(|source| aura.reaches(source, target))
        })
        .map(|aura| aura.name.as_str())
        .collect()
}

/// Bring every unit's aura modifiers in line with the aura list.
///
/// Units whose aura modifiers changed get their stats recomputed and, when
/// speed moved, their action value rescaled.
pub fn refresh(mut state: WorldState) -> WorldState {
    let ids: Vec<UnitId> = state.units.iter().map(|unit| unit.id).collect();
    for id in ids {
        let modifiers = modifiers_for(&state, id);
        let Some(unit) = state.unit_mut(id) else {
            continue;
        };
        if unit.aura_modifiers == modifiers {
            continue;
        }
        let old_speed = unit.speed();
        unit.aura_modifiers = modifiers;
        unit.recalculate_stats();
        state = schedule::rescale_for_speed(state, id, old_speed);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::state::Faction;
    use crate::stats::{Element, StatBlock, StatKey};

    fn create_test_unit(id: u32, faction: Faction) -> Unit {
        Unit::new(
            UnitId(id),
            format!("unit-{id}"),
            faction,
            Element::Fire,
            80,
            StatBlock::zeroed()
                .with(StatKey::Hp, 1000.0)
                .with(StatKey::Atk, 1000.0)
                .with(StatKey::Spd, 100.0),
        )
    }

    fn create_test_state() -> WorldState {
        let state = WorldState::new(BattleConfig::default())
            .with_unit(create_test_unit(0, Faction::Ally))
            .and_then(|state| state.with_unit(create_test_unit(1, Faction::Ally)))
            .and_then(|state| state.with_unit(create_test_unit(2, Faction::Enemy)))
            .expect("valid roster");
        schedule::sync_queue(state)
    }

    fn atk(state: &WorldState, id: u32) -> f64 {
        state.unit(UnitId(id)).expect("unit").stat(StatKey::Atk)
    }

    fn create_test_aura(id: &str, target: AuraTarget) -> Aura {
        Aura::new(id, "Banner", UnitId(0), target)
            .with_modifier(Modifier::pct(StatKey::AtkPct, 0.2, "Banner"))
    }

    #[test]
    fn aura_reaches_its_side_only() {
        let state = add_aura(create_test_state(), create_test_aura("banner", AuraTarget::AllAllies));
        assert!((atk(&state, 0) - 1200.0).abs() < 1e-9);
        assert!((atk(&state, 1) - 1200.0).abs() < 1e-9);
        assert_eq!(atk(&state, 2), 1000.0);
        assert_eq!(auras_on(&state, UnitId(1)), vec!["Banner"]);
    }

    #[test]
    fn other_allies_excludes_the_source() {
        let state = add_aura(create_test_state(), create_test_aura("banner", AuraTarget::OtherAllies));
        assert_eq!(atk(&state, 0), 1000.0);
        assert!((atk(&state, 1) - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn same_id_replaces_and_removal_restores_stats() {
        let state = add_aura(create_test_state(), create_test_aura("banner", AuraTarget::AllAllies));
        let state = add_aura(state, create_test_aura("banner", AuraTarget::AllEnemies));
        assert_eq!(state.auras.len(), 1);
        assert_eq!(atk(&state, 0), 1000.0);
        assert!((atk(&state, 2) - 1200.0).abs() < 1e-9);

        let state = remove_aura(state, "banner");
        assert!(state.auras.is_empty());
        assert_eq!(atk(&state, 2), 1000.0);
    }

    #[test]
    fn dead_sources_project_nothing() {
        let mut state =
            add_aura(create_test_state(), create_test_aura("banner", AuraTarget::AllAllies));
        state.unit_mut(UnitId(0)).expect("source").hp = 0.0;
        let state = refresh(state);
        assert_eq!(atk(&state, 1), 1000.0);

        let state = remove_auras_by_source(state, UnitId(0));
        assert!(state.auras.is_empty());
    }

    #[test]
    fn speed_auras_rescale_action_value() {
        let aura = Aura::new("tailwind", "Tailwind", UnitId(0), AuraTarget::AllAllies)
            .with_modifier(Modifier::pct(StatKey::SpdPct, 0.25, "Tailwind"));
        let state = add_aura(create_test_state(), aura);
        let ally = state.unit(UnitId(1)).expect("ally");
        assert!((ally.speed() - 125.0).abs() < 1e-9);
        assert!((ally.action_value - 80.0).abs() < 1e-9);
    }
}
