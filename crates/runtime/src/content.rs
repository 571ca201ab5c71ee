//! Content-module registry.
//!
//! Characters, weapons and set bonuses live outside the engine. Each one is
//! exposed as a factory keyed by a content id; the runtime calls the factory
//! once per unit that lists the id and registers the returned handler with
//! the dispatcher.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use combat_core::{ConfigError, HandlerRegistration, UnitId};

/// Builds the handler for one unit.
///
/// Receives the owning unit, its level and its upgrade tier.
pub trait ContentFactory: Send + Sync {
    fn create(&self, unit: UnitId, level: u32, tier: u32) -> HandlerRegistration;
}

impl<F> ContentFactory for F
where
    F: Fn(UnitId, u32, u32) -> HandlerRegistration + Send + Sync,
{
    fn create(&self, unit: UnitId, level: u32, tier: u32) -> HandlerRegistration {
        self(unit, level, tier)
    }
}

/// Content factories by id.
#[derive(Clone, Default)]
pub struct ContentRegistry {
    factories: BTreeMap<String, Arc<dyn ContentFactory>>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `id`.
    ///
    /// If a factory already exists for this id, it will be replaced.
    pub fn register(&mut self, id: impl Into<String>, factory: impl ContentFactory + 'static) {
        self.factories.insert(id.into(), Arc::new(factory));
    }

    #[must_use]
    pub fn with(mut self, id: impl Into<String>, factory: impl ContentFactory + 'static) -> Self {
        self.register(id, factory);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate the handler for `content` on `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownContent`] when no factory is registered
    /// under `content`.
    pub fn create(
        &self,
        content: &str,
        unit: UnitId,
        level: u32,
        tier: u32,
    ) -> Result<HandlerRegistration, ConfigError> {
        let factory = self
            .factories
            .get(content)
            .ok_or_else(|| ConfigError::UnknownContent {
                unit,
                content: content.to_string(),
            })?;
        Ok(factory.create(unit, level, tier))
    }
}

impl fmt::Debug for ContentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentRegistry")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
