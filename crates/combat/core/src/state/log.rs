//! Append-only battle log.

use super::{ActionKind, Effect, Unit, UnitId};

/// HP, shield and gauge snapshot of one unit at log time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitSnapshot {
    pub unit: UnitId,
    pub name: String,
    pub hp: f64,
    pub max_hp: f64,
    pub shield: f64,
    pub toughness: f64,
    pub max_toughness: f64,
    pub ep: f64,
}

impl UnitSnapshot {
    pub fn of(unit: &Unit) -> Self {
        Self {
            unit: unit.id,
            name: unit.name.clone(),
            hp: unit.hp,
            max_hp: unit.max_hp(),
            shield: unit.shield,
            toughness: unit.toughness,
            max_toughness: unit.max_toughness,
            ep: unit.ep,
        }
    }
}

/// One active effect at log time. `duration` is `None` for effects that
/// never count down.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSnapshot {
    pub owner: UnitId,
    pub name: String,
    pub duration: Option<u32>,
    pub stacks: u32,
}

impl EffectSnapshot {
    pub fn of(owner: UnitId, effect: &Effect) -> Self {
        Self {
            owner,
            name: effect.name.clone(),
            duration: effect.remaining_turns(),
            stacks: effect.stacks,
        }
    }

    /// Every effect attached to `unit`, in attach order.
    pub fn all_of(unit: &Unit) -> Vec<Self> {
        unit.effects
            .iter()
            .map(|effect| Self::of(unit.id, effect))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogEntry {
    pub actor: UnitId,
    pub actor_name: String,
    /// Human-readable action label ("Skill", "Turn skipped (Freeze)", ...).
    pub label: String,
    pub kind: Option<ActionKind>,
    pub time: f64,
    pub skill_points: i32,
    pub damage: f64,
    pub healing: f64,
    pub shield: f64,
    pub source: Option<UnitSnapshot>,
    pub targets: Vec<UnitSnapshot>,
    pub effects: Vec<EffectSnapshot>,
}

impl LogEntry {
    pub fn new(actor: &Unit, label: impl Into<String>, time: f64, skill_points: i32) -> Self {
        Self {
            actor: actor.id,
            actor_name: actor.name.clone(),
            label: label.into(),
            kind: None,
            time,
            skill_points,
            damage: 0.0,
            healing: 0.0,
            shield: 0.0,
            source: Some(UnitSnapshot::of(actor)),
            targets: Vec::new(),
            effects: Vec::new(),
        }
    }
}

/// Ordered action log. Entries are only ever appended.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionLog {
    entries: Vec<LogEntry>,
}

impl ActionLog {
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}
