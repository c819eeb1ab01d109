//! Sub-manager protocols.
//!
//! The orchestrator composes four keyed bookkeeping collaborators. Each one
//! exposes get/add/remove by string key; the orchestrator's shutdown path
//! depends on a current or designated element existing to remove.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ChannelError, ManagerError};
use crate::process::ProcessInput;

/// Keyed collection of process inputs.
pub trait ProcessManager<T: Send + 'static>: Send + Sync {
    fn get_process(&self, name: &str) -> Result<Arc<dyn ProcessInput<T>>, ManagerError>;

    fn add_process(
        &self,
        name: &str,
        process: Arc<dyn ProcessInput<T>>,
    ) -> Result<(), ManagerError>;

    fn remove_process(&self, name: &str) -> Result<(), ManagerError>;

    /// The process most recently made current, if any.
    fn current_process(&self) -> Option<Arc<dyn ProcessInput<T>>>;

    fn list_processes(&self) -> Vec<String>;
}

/// A named stage with its allowed outgoing transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stage {
    pub name: String,
    pub stage_type: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub metadata: BTreeMap<String, String>,
    pub transitions: BTreeSet<String>,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, stage_type: impl Into<String>) -> Self {
        self.stage_type = stage_type.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Allow moving from this stage to `target`.
    pub fn register_transition(&mut self, target: impl Into<String>) {
        self.transitions.insert(target.into());
    }

    /// A stage without registered transitions accepts any target.
    pub fn can_transition_to(&self, target: &str) -> bool {
        self.transitions.is_empty() || self.transitions.contains(target)
    }
}

/// Handler invoked with the payload of a triggered event.
pub type EventHandler = Arc<dyn Fn(&serde_json::Value) -> Result<(), String> + Send + Sync>;

/// A named event and its handlers.
#[derive(Clone, Default)]
pub struct Event {
    pub name: String,
    pub description: String,
    pub handlers: Vec<EventHandler>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_handler(
        mut self,
        handler: impl Fn(&serde_json::Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Keyed collection of stages with a current-stage pointer.
pub trait StageManager: Send + Sync {
    fn get_stage(&self, name: &str) -> Result<Stage, ManagerError>;

    fn add_stage(&self, stage: Stage) -> Result<(), ManagerError>;

    fn remove_stage(&self, name: &str) -> Result<(), ManagerError>;

    fn current_stage(&self) -> Option<Stage>;

    fn set_current_stage(&self, name: &str) -> Result<(), ManagerError>;
}

/// Keyed collection of events.
pub trait EventManager: Send + Sync {
    fn get_event(&self, name: &str) -> Result<Event, ManagerError>;

    fn add_event(&self, event: Event) -> Result<(), ManagerError>;

    fn remove_event(&self, name: &str) -> Result<(), ManagerError>;

    /// Run every handler of the event; returns how many succeeded.
    fn trigger_event(&self, name: &str, payload: &serde_json::Value)
        -> Result<usize, ManagerError>;
}

/// Forwards OS signals into the control plane.
pub trait SignalManager: Send + Sync {
    /// Install the signal listeners. Requires a running tokio runtime.
    fn listen_for_signals(&self) -> Result<(), ManagerError>;

    fn stop_listening(&self);

    fn is_listening(&self) -> bool;

    /// Push a signal name into the control plane as if it had been received.
    fn forward(&self, signal: &str) -> Result<(), ChannelError>;
}
