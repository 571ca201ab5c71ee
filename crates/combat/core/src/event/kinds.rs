use strum::{EnumCount, EnumIter, IntoStaticStr};

use crate::damage::DamageKind;
use crate::state::{ActionKind, DotType, EffectId, UnitId};
use crate::stats::Element;

/// Discriminant of an [`Event`], used for subscriptions.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumCount, IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    BattleStart,
    TurnStart,
    TurnEnd,
    BeforeDamageCalculation,
    DamageDealt,
    DotDamage,
    WeaknessBreak,
    WeaknessBreakRecoveryAttempt,
    BasicAttack,
    SkillUsed,
    UltimateUsed,
    FollowUpAttack,
    ActionComplete,
    UnitHealed,
    EffectApplied,
    EffectRemoved,
    UnitDefeated,
    UnitSummoned,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Event announcing an ability use of the given kind.
    pub const fn for_action(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Basic => EventKind::BasicAttack,
            ActionKind::Skill => EventKind::SkillUsed,
            ActionKind::Ultimate => EventKind::UltimateUsed,
            ActionKind::FollowUp => EventKind::FollowUpAttack,
        }
    }
}

/// Everything that can happen in a battle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    // ========================================================================
    // Battle and turns
    // ========================================================================
    BattleStart,
    TurnStart {
        unit: UnitId,
    },
    TurnEnd {
        unit: UnitId,
    },

    // ========================================================================
    // Damage and break
    // ========================================================================
    /// Handlers may write one-shot bonuses into `WorldState::damage_modifiers`.
    BeforeDamageCalculation {
        source: UnitId,
        target: UnitId,
        action: ActionKind,
        element: Element,
    },
    DamageDealt {
        source: UnitId,
        target: UnitId,
        amount: f64,
        kind: DamageKind,
        action: Option<ActionKind>,
        is_crit: bool,
        killed: bool,
    },
    DotDamage {
        source: UnitId,
        target: UnitId,
        amount: f64,
        dot_type: DotType,
    },
    WeaknessBreak {
        source: UnitId,
        target: UnitId,
        element: Element,
    },
    WeaknessBreakRecoveryAttempt {
        unit: UnitId,
    },

    // ========================================================================
    // Abilities
    // ========================================================================
    BasicAttack {
        source: UnitId,
        targets: Vec<UnitId>,
    },
    SkillUsed {
        source: UnitId,
        targets: Vec<UnitId>,
    },
    UltimateUsed {
        source: UnitId,
        targets: Vec<UnitId>,
    },
    FollowUpAttack {
        source: UnitId,
        targets: Vec<UnitId>,
    },
    ActionComplete {
        source: UnitId,
        action: ActionKind,
    },

    // ========================================================================
    // Healing, effects, defeat
    // ========================================================================
    UnitHealed {
        source: UnitId,
        target: UnitId,
        amount: f64,
    },
    EffectApplied {
        source: UnitId,
        target: UnitId,
        effect: EffectId,
    },
    EffectRemoved {
        source: UnitId,
        target: UnitId,
        effect: EffectId,
    },
    UnitDefeated {
        unit: UnitId,
        killer: Option<UnitId>,
    },
    UnitSummoned {
        owner: UnitId,
        summon: UnitId,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::BattleStart => EventKind::BattleStart,
            Event::TurnStart { .. } => EventKind::TurnStart,
            Event::TurnEnd { .. } => EventKind::TurnEnd,
            Event::BeforeDamageCalculation { .. } => EventKind::BeforeDamageCalculation,
            Event::DamageDealt { .. } => EventKind::DamageDealt,
            Event::DotDamage { .. } => EventKind::DotDamage,
            Event::WeaknessBreak { .. } => EventKind::WeaknessBreak,
            Event::WeaknessBreakRecoveryAttempt { .. } => EventKind::WeaknessBreakRecoveryAttempt,
            Event::BasicAttack { .. } => EventKind::BasicAttack,
            Event::SkillUsed { .. } => EventKind::SkillUsed,
            Event::UltimateUsed { .. } => EventKind::UltimateUsed,
            Event::FollowUpAttack { .. } => EventKind::FollowUpAttack,
            Event::ActionComplete { .. } => EventKind::ActionComplete,
            Event::UnitHealed { .. } => EventKind::UnitHealed,
            Event::EffectApplied { .. } => EventKind::EffectApplied,
            Event::EffectRemoved { .. } => EventKind::EffectRemoved,
            Event::UnitDefeated { .. } => EventKind::UnitDefeated,
            Event::UnitSummoned { .. } => EventKind::UnitSummoned,
        }
    }

    /// Ability-use event for `kind`.
    pub fn for_action(kind: ActionKind, source: UnitId, targets: Vec<UnitId>) -> Self {
        match kind {
            ActionKind::Basic => Event::BasicAttack { source, targets },
            ActionKind::Skill => Event::SkillUsed { source, targets },
            ActionKind::Ultimate => Event::UltimateUsed { source, targets },
            ActionKind::FollowUp => Event::FollowUpAttack { source, targets },
        }
    }

    /// Unit that caused the event, if any.
    pub fn source(&self) -> Option<UnitId> {
        match self {
            Event::BattleStart => None,
            Event::TurnStart { unit }
            | Event::TurnEnd { unit }
            | Event::WeaknessBreakRecoveryAttempt { unit } => Some(*unit),
            Event::BeforeDamageCalculation { source, .. }
            | Event::DamageDealt { source, .. }
            | Event::DotDamage { source, .. }
            | Event::WeaknessBreak { source, .. }
            | Event::BasicAttack { source, .. }
            | Event::SkillUsed { source, .. }
            | Event::UltimateUsed { source, .. }
            | Event::FollowUpAttack { source, .. }
            | Event::ActionComplete { source, .. }
            | Event::UnitHealed { source, .. }
            | Event::EffectApplied { source, .. }
            | Event::EffectRemoved { source, .. } => Some(*source),
            Event::UnitDefeated { killer, .. } => *killer,
            Event::UnitSummoned { owner, .. } => Some(*owner),
        }
    }

    /// Primary unit the event happened to, if any.
    pub fn target(&self) -> Option<UnitId> {
        match self {
            Event::BattleStart | Event::ActionComplete { .. } => None,
            Event::TurnStart { unit }
            | Event::TurnEnd { unit }
            | Event::WeaknessBreakRecoveryAttempt { unit }
            | Event::UnitDefeated { unit, .. } => Some(*unit),
            Event::UnitSummoned { summon, .. } => Some(*summon),
            Event::BeforeDamageCalculation { target, .. }
            | Event::DamageDealt { target, .. }
            | Event::DotDamage { target, .. }
            | Event::WeaknessBreak { target, .. }
            | Event::UnitHealed { target, .. }
            | Event::EffectApplied { target, .. }
            | Event::EffectRemoved { target, .. } => Some(*target),
            Event::BasicAttack { targets, .. }
            | Event::SkillUsed { targets, .. }
            | Event::UltimateUsed { targets, .. }
            | Event::FollowUpAttack { targets, .. } => targets.first().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_events_map_to_matching_kinds() {
        for action in [
            ActionKind::Basic,
            ActionKind::Skill,
            ActionKind::Ultimate,
            ActionKind::FollowUp,
        ] {
            let event = Event::for_action(action, UnitId(0), vec![UnitId(5)]);
            assert_eq!(event.kind(), EventKind::for_action(action));
            assert_eq!(event.target(), Some(UnitId(5)));
        }
    }

    #[test]
    fn kind_names_are_screaming_snake_case() {
        assert_eq!(EventKind::BeforeDamageCalculation.as_str(), "BEFORE_DAMAGE_CALCULATION");
        assert_eq!(EventKind::TurnStart.as_str(), "TURN_START");
    }
}
