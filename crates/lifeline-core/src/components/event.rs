//! In-memory event table.

use std::sync::Arc;

use tracing::{debug, warn};

use lifeline_protocols::{Event, EventManager, ManagerError};

use crate::registry::BaseRegistry;

/// Keyed events with their handlers.
pub struct EventTable {
    events: BaseRegistry<Event>,
}

impl EventTable {
    pub fn new() -> Self {
        Self {
            events: BaseRegistry::new("Event"),
        }
    }

    pub fn list_events(&self) -> Vec<String> {
        self.events.keys()
    }
}

impl Default for EventTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EventManager for EventTable {
    fn get_event(&self, name: &str) -> Result<Event, ManagerError> {
        self.events.require(name).map(|event| Event::clone(&event))
    }

    fn add_event(&self, event: Event) -> Result<(), ManagerError> {
        let name = event.name.clone();
        self.events.register(&name, Arc::new(event))
    }

    fn remove_event(&self, name: &str) -> Result<(), ManagerError> {
        self.events.unregister(name)?;
        debug!("Event {} removed", name);
        Ok(())
    }

    /// Run every handler; failures are logged and not counted.
    fn trigger_event(
        &self,
        name: &str,
        payload: &serde_json::Value,
    ) -> Result<usize, ManagerError> {
        let event = self.events.require(name)?;
        let mut succeeded = 0;
        for (index, handler) in event.handlers.iter().enumerate() {
            match handler(payload) {
                Ok(()) => succeeded += 1,
                Err(e) => warn!("Handler {} of event {} failed: {}", index, name, e),
            }
        }
        debug!("Event {} triggered ({} handlers ok)", name, succeeded);
        Ok(succeeded)
    }
}
