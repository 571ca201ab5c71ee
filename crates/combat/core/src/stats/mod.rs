//! Stat keys, stat blocks and the stat resolver.
//!
//! Effective stats are never edited by hand: they are always recomputed from
//! the unit's base block, its gear modifiers, the auras reaching it and the
//! modifiers of its active effects via [`resolve_stats`].

mod block;
mod element;
mod key;
mod modifier;
mod resolver;

pub use block::StatBlock;
pub use element::{Element, ElementSet};
pub use key::StatKey;
pub use modifier::{Modifier, ModifierKind, StackScaling};
pub use resolver::{StatLayers, resolve_stats};
