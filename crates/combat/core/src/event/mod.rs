//! Event dispatcher.
//!
//! Every game happening is an [`Event`] broadcast to the handlers subscribed
//! to its [`EventKind`]. Handlers run in registration order and each receives
//! the state returned by the previous one. The list of handlers is captured
//! before the first one runs, so handlers registered or removed while an
//! event is being published do not change who sees that event.

mod kinds;
mod registry;

pub use kinds::{Event, EventKind};
pub use registry::{EventHandler, HandlerRegistration, HandlerRegistry};

use tracing::trace;

use crate::error::Result;
use crate::state::{HandlerId, WorldState};

/// Broadcast `event` and thread the state through every subscriber.
///
/// The first handler error aborts the publish and is returned as-is.
pub fn publish(mut state: WorldState, event: &Event) -> Result<WorldState> {
    let kind = event.kind();
    let handlers = state.handlers.snapshot(kind);
    for (id, handler) in handlers {
        trace!(
            target: "combat::dispatch",
            handler = %id,
            event = kind.as_str(),
            "invoking handler"
        );
        state = handler.handle(event, state, &id)?;
    }
    Ok(state)
}

pub fn register(mut state: WorldState, registration: HandlerRegistration) -> WorldState {
    state.handlers.register(registration);
    state
}

pub fn unregister(mut state: WorldState, id: &HandlerId) -> WorldState {
    state.handlers.unregister(id);
    state.cooldowns.remove(id);
    state
}

// ============================================================================
// Handler cooldowns
// ============================================================================

/// Block a handler for `turns` turn ends.
pub fn set_cooldown(mut state: WorldState, id: &HandlerId, turns: u32) -> WorldState {
    if turns == 0 {
        state.cooldowns.remove(id);
    } else {
        state.cooldowns.insert(id.clone(), turns);
    }
    state
}

pub fn is_on_cooldown(state: &WorldState, id: &HandlerId) -> bool {
    state.cooldowns.get(id).is_some_and(|turns| *turns > 0)
}

/// Decrement every handler cooldown, dropping the ones that reach zero.
pub fn tick_cooldowns(mut state: WorldState) -> WorldState {
    state.cooldowns.retain(|_, turns| {
        *turns = turns.saturating_sub(1);
        *turns > 0
    });
    state
}
