//! Effect records attached to units.
//!
//! An effect is plain data plus an optional [`EffectHooks`] object. Anything
//! an effect needs to remember between callbacks lives in [`Effect::locals`],
//! so cloning the world state clones the effect's memory with it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::error::Result;
use crate::event::{Event, EventKind};
use crate::stats::{Element, Modifier, StatKey};

use super::{EffectId, UnitId, WorldState};

/// Broad classification used by immunity, cleanse and dispel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectCategory {
    Buff,
    Debuff,
    Status,
}

/// When an effect's remaining duration is decremented.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DurationPolicy {
    /// Never expires on its own.
    Permanent,
    /// Decrements at the start of the owner's turn.
    TurnStart,
    /// Decrements at the end of the owner's turn.
    TurnEnd,
    /// Lives exactly as long as the parent effect on `unit`.
    Tied { unit: UnitId, effect: EffectId },
}

bitflags! {
    /// Capability flags carried by an effect.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EffectCaps: u8 {
        /// The owner cannot act while this effect is present.
        const CROWD_CONTROL = 1 << 0;
        /// Hit chance ignores the target's resistances.
        const IGNORE_RESISTANCE = 1 << 1;
        const CLEANSABLE = 1 << 2;
        const DISPELLABLE = 1 << 3;
        /// A broken enemy carrying this effect skips its turn instead of recovering toughness.
        const SKIP_TOUGHNESS_RECOVERY = 1 << 4;
        /// The owner's actions do not end the turn while this effect is present.
        const PREVENT_TURN_END = 1 << 5;
    }
}

/// Damage-over-time flavours, one per break element that inflicts one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DotType {
    Bleed,
    Burn,
    Shock,
    WindShear,
}

impl DotType {
    pub const fn element(self) -> Element {
        match self {
            DotType::Bleed => Element::Physical,
            DotType::Burn => Element::Fire,
            DotType::Shock => Element::Lightning,
            DotType::WindShear => Element::Wind,
        }
    }

    pub const fn resistance(self) -> StatKey {
        match self {
            DotType::Bleed => StatKey::BleedRes,
            DotType::Burn => StatKey::BurnRes,
            DotType::Shock => StatKey::ShockRes,
            DotType::WindShear => StatKey::WindShearRes,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DotType::Bleed => "Bleed",
            DotType::Burn => "Burn",
            DotType::Shock => "Shock",
            DotType::WindShear => "WindShear",
        }
    }
}

/// How a DoT tick computes its base damage.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DotCalc {
    /// Ability DoT: `scaling stat of the source × multiplier`.
    Multiplier { stat: StatKey, multiplier: f64 },
    /// Break DoT: a precomputed base per stack.
    Fixed { base_damage: f64 },
}

/// Crowd-control statuses inflicted by weakness break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BreakStatus {
    Freeze,
    Entanglement,
    Imprisonment,
}

impl BreakStatus {
    pub const fn resistance(self) -> StatKey {
        match self {
            BreakStatus::Freeze => StatKey::FrozenRes,
            BreakStatus::Entanglement => StatKey::EntanglementRes,
            BreakStatus::Imprisonment => StatKey::ImprisonmentRes,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            BreakStatus::Freeze => "Freeze",
            BreakStatus::Entanglement => "Entanglement",
            BreakStatus::Imprisonment => "Imprisonment",
        }
    }
}

/// Engine-interpreted payload of an effect.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    #[default]
    Plain,
    Shield {
        value: f64,
    },
    Dot {
        dot_type: DotType,
        calc: DotCalc,
    },
    BreakStatus {
        status: BreakStatus,
        delay: f64,
        damage_per_stack: f64,
    },
}

/// Lifecycle callbacks of an effect. All default to no-ops.
///
/// Callbacks receive a snapshot of the effect record; changes they want to
/// persist must be written back through the returned state.
pub trait EffectHooks: Send + Sync {
    fn on_attach(&self, state: WorldState, _owner: UnitId, _effect: &Effect) -> Result<WorldState> {
        Ok(state)
    }

    fn on_detach(&self, state: WorldState, _owner: UnitId, _effect: &Effect) -> Result<WorldState> {
        Ok(state)
    }

    /// Runs each time the effect's duration is decremented.
    fn on_tick(&self, state: WorldState, _owner: UnitId, _effect: &Effect) -> Result<WorldState> {
        Ok(state)
    }

    /// Runs for every published event whose kind is in [`Effect::subscriptions`].
    fn on_event(
        &self,
        _event: &Event,
        state: WorldState,
        _owner: UnitId,
        _effect: &Effect,
    ) -> Result<WorldState> {
        Ok(state)
    }
}

/// A buff, debuff or status attached to a unit.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Effect {
    pub id: EffectId,
    pub name: String,
    pub category: EffectCategory,
    pub source: UnitId,
    pub duration: DurationPolicy,
    /// Remaining turns for `TurnStart`/`TurnEnd` effects.
    pub remaining: u32,
    pub stacks: u32,
    pub max_stacks: u32,
    pub modifiers: Vec<Modifier>,
    pub caps: EffectCaps,
    pub kind: EffectKind,
    pub subscriptions: Vec<EventKind>,
    pub locals: BTreeMap<String, f64>,
    /// The first turn-end tick only clears `applied_during_turn_of`.
    pub skip_first_turn_decrement: bool,
    pub applied_during_turn_of: Option<UnitId>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub hooks: Option<Arc<dyn EffectHooks>>,
}

impl Effect {
    pub fn new(
        id: impl Into<EffectId>,
        name: impl Into<String>,
        category: EffectCategory,
        source: UnitId,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            source,
            duration: DurationPolicy::Permanent,
            remaining: 0,
            stacks: 1,
            max_stacks: 1,
            modifiers: Vec::new(),
            caps: EffectCaps::empty(),
            kind: EffectKind::Plain,
            subscriptions: Vec::new(),
            locals: BTreeMap::new(),
            skip_first_turn_decrement: false,
            applied_during_turn_of: None,
            hooks: None,
        }
    }

    pub fn buff(id: impl Into<EffectId>, name: impl Into<String>, source: UnitId) -> Self {
        Self::new(id, name, EffectCategory::Buff, source).with_caps(EffectCaps::DISPELLABLE)
    }

    pub fn debuff(id: impl Into<EffectId>, name: impl Into<String>, source: UnitId) -> Self {
        Self::new(id, name, EffectCategory::Debuff, source).with_caps(EffectCaps::CLEANSABLE)
    }

    pub fn status(id: impl Into<EffectId>, name: impl Into<String>, source: UnitId) -> Self {
        Self::new(id, name, EffectCategory::Status, source)
    }

    #[must_use]
    pub fn turn_start(mut self, turns: u32) -> Self {
        self.duration = DurationPolicy::TurnStart;
        self.remaining = turns;
        self
    }

    #[must_use]
    pub fn turn_end(mut self, turns: u32) -> Self {
        self.duration = DurationPolicy::TurnEnd;
        self.remaining = turns;
        self
    }

    #[must_use]
    pub fn tied_to(mut self, unit: UnitId, effect: impl Into<EffectId>) -> Self {
        self.duration = DurationPolicy::Tied {
            unit,
            effect: effect.into(),
        };
        self
    }

    #[must_use]
    pub fn with_stacks(mut self, stacks: u32, max_stacks: u32) -> Self {
        self.stacks = stacks;
        self.max_stacks = max_stacks;
        self
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    #[must_use]
    pub fn with_caps(mut self, caps: EffectCaps) -> Self {
        self.caps |= caps;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: EffectKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn EffectHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    #[must_use]
    pub fn subscribe(mut self, kind: EventKind) -> Self {
        if !self.subscriptions.contains(&kind) {
            self.subscriptions.push(kind);
        }
        self
    }

    #[must_use]
    pub fn skip_first_turn_decrement(mut self) -> Self {
        self.skip_first_turn_decrement = true;
        self
    }

    pub fn is_debuff(&self) -> bool {
        self.category == EffectCategory::Debuff
    }

    pub fn is_crowd_control(&self) -> bool {
        self.caps.contains(EffectCaps::CROWD_CONTROL)
    }

    pub fn is_tied(&self) -> bool {
        matches!(self.duration, DurationPolicy::Tied { .. })
    }

    pub fn is_shield(&self) -> bool {
        matches!(self.kind, EffectKind::Shield { .. })
    }

    pub fn local(&self, key: &str) -> f64 {
        self.locals.get(key).copied().unwrap_or(0.0)
    }

    /// Remaining turns, or `None` for effects that do not count down.
    pub fn remaining_turns(&self) -> Option<u32> {
        match self.duration {
            DurationPolicy::TurnStart | DurationPolicy::TurnEnd => Some(self.remaining),
            DurationPolicy::Permanent | DurationPolicy::Tied { .. } => None,
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("source", &self.source)
            .field("duration", &self.duration)
            .field("remaining", &self.remaining)
            .field("stacks", &self.stacks)
            .field("max_stacks", &self.max_stacks)
            .field("caps", &self.caps)
            .field("kind", &self.kind)
            .field("has_hooks", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}
