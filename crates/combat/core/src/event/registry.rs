//! Handler registry for the event dispatcher.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::state::{HandlerId, WorldState};

use super::{Event, EventKind};

/// A subscriber: a pure function from the current state to the next one.
///
/// A handler that does not apply to an event returns the state unchanged.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event, state: WorldState, id: &HandlerId) -> Result<WorldState>;
}

impl<F> EventHandler for F
where
    F: Fn(&Event, WorldState, &HandlerId) -> Result<WorldState> + Send + Sync,
{
    fn handle(&self, event: &Event, state: WorldState, id: &HandlerId) -> Result<WorldState> {
        self(event, state, id)
    }
}

/// What a content-module factory hands to the dispatcher.
#[derive(Clone)]
pub struct HandlerRegistration {
    pub id: HandlerId,
    pub subscriptions: Vec<EventKind>,
    pub handler: Arc<dyn EventHandler>,
}

impl HandlerRegistration {
    /// Registration backed by a closure.
    pub fn new<F>(
        id: impl Into<HandlerId>,
        subscriptions: impl IntoIterator<Item = EventKind>,
        handler: F,
    ) -> Self
    where
        F: Fn(&Event, WorldState, &HandlerId) -> Result<WorldState> + Send + Sync + 'static,
    {
        Self::from_handler(id, subscriptions, Arc::new(handler))
    }

    pub fn from_handler(
        id: impl Into<HandlerId>,
        subscriptions: impl IntoIterator<Item = EventKind>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            id: id.into(),
            subscriptions: subscriptions.into_iter().collect(),
            handler,
        }
    }

    pub fn subscribes_to(&self, kind: EventKind) -> bool {
        self.subscriptions.contains(&kind)
    }
}

impl fmt::Debug for HandlerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistration")
            .field("id", &self.id)
            .field("subscriptions", &self.subscriptions)
            .finish_non_exhaustive()
    }
}

/// Registered handlers in registration order.
///
/// Order is part of the contract: handlers reacting to the same event run in
/// the order they were registered, and each one sees the state returned by
/// the previous one.
#[derive(Clone, Debug, Default)]
pub struct HandlerRegistry {
    entries: Vec<HandlerRegistration>,
}

impl HandlerRegistry {
    /// Append a handler. A handler whose id is already registered is skipped.
    pub fn register(&mut self, registration: HandlerRegistration) -> bool {
        if self.contains(&registration.id) {
            warn!(
                target: "combat::dispatch",
                handler = %registration.id,
                "handler id already registered; skipping"
            );
            return false;
        }
        self.entries.push(registration);
        true
    }

    pub fn unregister(&mut self, id: &HandlerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| &entry.id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: &HandlerId) -> bool {
        self.entries.iter().any(|entry| &entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handler ids in registration order (for diagnostics).
    pub fn ids(&self) -> impl Iterator<Item = &HandlerId> + '_ {
        self.entries.iter().map(|entry| &entry.id)
    }

    /// Handlers subscribed to `kind`, captured at call time.
    pub fn snapshot(&self, kind: EventKind) -> Vec<(HandlerId, Arc<dyn EventHandler>)> {
        self.entries
            .iter()
            .filter(|entry| entry.subscribes_to(kind))
            .map(|entry| (entry.id.clone(), Arc::clone(&entry.handler)))
            .collect()
    }
}
