//! Target selection and hit generation.
//!
//! Targets are resolved against living units at the moment the action is
//! dispatched, except bounce hits, which pick their target as they land.
//! Random picks (bounce hits, enemy aggro) draw from the world state's roll
//! source so they replay with the seed.

use arrayvec::ArrayVec;
use tracing::warn;

use crate::config::BattleConfig;
use crate::rng::RollContext;
use crate::state::{Ability, DamageShape, TargetType, UnitId, WorldState};
use crate::stats::StatKey;

/// One damage instance an ability will deal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub target: UnitId,
    pub multiplier: f64,
    /// Blast neighbour of the main target.
    pub adjacent: bool,
    /// `target` is only a placeholder until [`pick_bounce_target`] runs.
    pub bounce: bool,
}

impl Hit {
    fn main(target: UnitId, multiplier: f64) -> Self {
        Self {
            target,
            multiplier,
            adjacent: false,
            bounce: false,
        }
    }

    fn bounce(placeholder: UnitId, multiplier: f64) -> Self {
        Self {
            bounce: true,
            ..Self::main(placeholder, multiplier)
        }
    }

    /// The same hit aimed at `target`.
    #[must_use]
    pub fn aimed_at(self, target: UnitId) -> Self {
        Self {
            target,
            bounce: false,
            ..self
        }
    }
}

pub type Hits = ArrayVec<Hit, { BattleConfig::MAX_HITS_PER_ACTION }>;

fn push_hit(hits: &mut Hits, hit: Hit) {
    if hits.try_push(hit).is_err() {
        warn!(
            target: "combat::resolver",
            target_unit = %hit.target,
            "hit limit reached, dropping hit"
        );
    }
}

// ============================================================================
// Target Selection
// ============================================================================

/// Aggro-weighted pick among the targetable opponents of `attacker`.
///
/// Units without an aggro stat weigh [`BattleConfig::DEFAULT_AGGRO`].
pub fn pick_weighted_target(state: &mut WorldState, attacker: UnitId) -> Option<UnitId> {
    let candidates: Vec<(UnitId, f64)> = state
        .opponents_of(attacker)
        .into_iter()
        .filter_map(|id| state.unit(id))
        .filter(|unit| unit.is_targetable())
        .map(|unit| {
            let aggro = unit.stat(StatKey::Aggro);
            let weight = if aggro > 0.0 {
                aggro
            } else {
                BattleConfig::DEFAULT_AGGRO
            };
            (unit.id, weight)
        })
        .collect();
    let weights: Vec<f64> = candidates.iter().map(|(_, weight)| *weight).collect();
    let index = state.rng.pick_weighted(&weights, RollContext::Targeting)?;
    candidates.get(index).map(|(id, _)| *id)
}

/// Uniform pick among the living opponents of `attacker` right now.
///
/// Bounce hits call this just before landing, so a unit killed by an earlier
/// bounce of the same action is never picked.
pub fn pick_bounce_target(state: &mut WorldState, attacker: UnitId) -> Option<UnitId> {
    let opponents = state.opponents_of(attacker);
    let index = state.rng.pick_index(opponents.len(), RollContext::Bounce)?;
    opponents.get(index).copied()
}

/// Target used when the caller does not name one: the first living opponent
/// for offensive abilities, the actor itself otherwise.
pub fn default_target(state: &WorldState, actor: UnitId, target: TargetType) -> Option<UnitId> {
    if target.is_offensive() {
        state.opponents_of(actor).first().copied()
    } else {
        Some(actor)
    }
}

/// Units an ability affects, main target first.
///
/// A requested target that is dead or on the wrong side falls back to
/// [`default_target`].
pub fn resolve_targets(
    state: &WorldState,
    actor: UnitId,
    target: TargetType,
    requested: Option<UnitId>,
) -> Vec<UnitId> {
    let opponents = state.opponents_of(actor);
    let teammates = state.teammates_of(actor);
    let pick = |pool: &[UnitId]| {
        requested
            .filter(|id| pool.contains(id))
            .or_else(|| default_target(state, actor, target).filter(|id| pool.contains(id)))
    };
    match target {
        TargetType::SingleEnemy | TargetType::Bounce => pick(&opponents).into_iter().collect(),
        TargetType::Blast => {
            let Some(main) = pick(&opponents) else {
                return Vec::new();
            };
            let mut targets = vec![main];
            targets.extend(neighbours(&opponents, main));
            targets
        }
        TargetType::AllEnemies => opponents,
        TargetType::Ally => pick(&teammates).into_iter().collect(),
        TargetType::AllAllies => teammates,
        TargetType::SelfOnly => vec![actor],
    }
}

/// Units directly left and right of `main` in `pool`.
fn neighbours(pool: &[UnitId], main: UnitId) -> impl Iterator<Item = UnitId> + '_ {
    let position = pool.iter().position(|id| *id == main);
    let left = position
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| pool.get(index));
    let right = position.and_then(|index| pool.get(index + 1));
    left.into_iter().chain(right).copied()
}

// ============================================================================
// Hit Generation
// ============================================================================

/// Expand an ability's damage shape into hits on its resolved targets.
///
/// Only opponents of the actor are hit. Bounce shapes yield one unaimed hit
/// per multiplier; the caller aims each with [`pick_bounce_target`] as it
/// lands.
pub fn generate_hits(
    state: &mut WorldState,
    actor: UnitId,
    ability: &Ability,
    targets: &[UnitId],
) -> Hits {
    let mut hits = Hits::new();
    let Some(damage) = &ability.damage else {
        return hits;
    };
    let opponents = state.opponents_of(actor);
    match &damage.shape {
        DamageShape::Simple { multiplier } => {
            for target in targets.iter().filter(|id| opponents.contains(id)) {
                push_hit(&mut hits, Hit::main(*target, *multiplier));
            }
        }
        DamageShape::Blast { main, adjacent } => {
            let Some(primary) = targets.first().filter(|id| opponents.contains(id)) else {
                return hits;
            };
            push_hit(&mut hits, Hit::main(*primary, *main));
            for neighbour in neighbours(&opponents, *primary) {
                push_hit(
                    &mut hits,
                    Hit {
                        target: neighbour,
                        multiplier: *adjacent,
                        adjacent: true,
                        bounce: false,
                    },
                );
            }
        }
        DamageShape::Bounce { multipliers } => {
            let Some(placeholder) = opponents.first() else {
                return hits;
            };
            for multiplier in multipliers {
                push_hit(&mut hits, Hit::bounce(*placeholder, *multiplier));
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::rng::{FixedRng, RollSource};
    use crate::state::{DamageSpec, Faction, Unit};
    use crate::stats::{Element, StatBlock};

    fn create_test_unit(id: u32, faction: Faction, aggro: f64) -> Unit {
        Unit::new(
            UnitId(id),
            format!("unit-{id}"),
            faction,
            Element::Fire,
            80,
            StatBlock::zeroed()
                .with(StatKey::Hp, 1000.0)
                .with(StatKey::Spd, 100.0)
                .with(StatKey::Aggro, aggro),
        )
    }

    fn create_test_state() -> WorldState {
        let mut state = WorldState::new(BattleConfig::default());
        state
            .add_unit(create_test_unit(0, Faction::Ally, 0.0))
            .expect("ally 0");
        state
            .add_unit(create_test_unit(1, Faction::Ally, 300.0))
            .expect("ally 1");
        for id in 2..6 {
            state
                .add_unit(create_test_unit(id, Faction::Enemy, 0.0))
                .expect("enemy");
        }
        state
    }

    #[test]
    fn blast_hits_main_and_neighbours() {
        let mut state = create_test_state();
        let ability = Ability::new("Blast", TargetType::Blast).with_damage(DamageSpec::blast(2.0, 1.0));
        let targets = resolve_targets(&state, UnitId(0), ability.target, Some(UnitId(3)));
        assert_eq!(targets, vec![UnitId(3), UnitId(2), UnitId(4)]);
        let hits = generate_hits(&mut state, UnitId(0), &ability, &targets);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0], Hit::main(UnitId(3), 2.0));
        assert!(hits[1].adjacent && hits[2].adjacent);
        assert_eq!(hits[2].multiplier, 1.0);
    }

    #[test]
    fn blast_on_the_edge_has_one_neighbour() {
        let state = create_test_state();
        let targets = resolve_targets(&state, UnitId(0), TargetType::Blast, Some(UnitId(5)));
        assert_eq!(targets, vec![UnitId(5), UnitId(4)]);
    }

    #[test]
    fn dead_requested_target_falls_back_to_first_opponent() {
        let mut state = create_test_state();
        state.unit_mut(UnitId(2)).expect("enemy").hp = 0.0;
        state.unit_mut(UnitId(3)).expect("enemy").hp = 0.0;
        let targets = resolve_targets(&state, UnitId(0), TargetType::SingleEnemy, Some(UnitId(2)));
        assert_eq!(targets, vec![UnitId(4)]);
    }

    #[test]
    fn bounce_hits_are_aimed_when_they_land() {
        let mut state =
            create_test_state().with_rng(RollSource::with_oracle(0, Arc::new(FixedRng(0))));
        let ability = Ability::new("Bounce", TargetType::Bounce)
            .with_damage(DamageSpec::bounce(vec![0.5, 0.5, 0.5, 0.5, 0.5]));
        let targets = resolve_targets(&state, UnitId(0), ability.target, None);
        let hits = generate_hits(&mut state, UnitId(0), &ability, &targets);
        assert_eq!(hits.len(), 5);
        assert!(hits.iter().all(|hit| hit.bounce));
        assert_eq!(state.rng.draws(), 0);
    }

    #[test]
    fn bounce_target_skips_units_that_already_fell() {
        let mut state =
            create_test_state().with_rng(RollSource::with_oracle(0, Arc::new(FixedRng(0))));
        assert_eq!(pick_bounce_target(&mut state, UnitId(0)), Some(UnitId(2)));
        state.unit_mut(UnitId(2)).expect("enemy").hp = 0.0;
        assert_eq!(pick_bounce_target(&mut state, UnitId(0)), Some(UnitId(3)));
        assert_eq!(state.rng.draws(), 2);
    }

    #[test]
    fn support_abilities_generate_no_hits() {
        let mut state = create_test_state();
        let ability = Ability::new("Heal", TargetType::AllAllies);
        let targets = resolve_targets(&state, UnitId(0), ability.target, None);
        assert_eq!(targets, vec![UnitId(0), UnitId(1)]);
        assert!(generate_hits(&mut state, UnitId(0), &ability, &targets).is_empty());
    }

    #[test]
    fn aggro_weights_enemy_targeting() {
        // A roll of 0.5 lands past the first 100 of 400 total weight.
        let mut state = create_test_state()
            .with_rng(RollSource::with_oracle(0, Arc::new(FixedRng(u32::MAX / 2))));
        assert_eq!(pick_weighted_target(&mut state, UnitId(2)), Some(UnitId(1)));

        let mut state =
            create_test_state().with_rng(RollSource::with_oracle(0, Arc::new(FixedRng(0))));
        assert_eq!(pick_weighted_target(&mut state, UnitId(2)), Some(UnitId(0)));
    }

    #[test]
    fn untargetable_units_are_never_picked() {
        let mut state =
            create_test_state().with_rng(RollSource::with_oracle(0, Arc::new(FixedRng(0))));
        state.unit_mut(UnitId(0)).expect("ally").flags |= crate::state::UnitFlags::UNTARGETABLE;
        assert_eq!(pick_weighted_target(&mut state, UnitId(2)), Some(UnitId(1)));
    }
}
