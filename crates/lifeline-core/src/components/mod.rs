//! Sub-managers composed into a lifecycle.
//!
//! [`ComponentSet`] holds the four collaborators by explicit field. Each one
//! may be absent; the lifecycle reports absence through its structural
//! validation.

mod event;
mod process;
mod signal;
mod stage;

use std::fmt;
use std::sync::Arc;

use lifeline_protocols::{EventManager, ProcessManager, SignalManager, StageManager};

use crate::channel::ChannelBase;

pub use event::EventTable;
pub use process::ProcessTable;
pub use signal::OsSignalManager;
pub use stage::StageTable;

/// A sub-manager looked up by name.
pub enum Component<T: Send + 'static> {
    Process(Arc<dyn ProcessManager<T>>),
    Stage(Arc<dyn StageManager>),
    Event(Arc<dyn EventManager>),
    Signal(Arc<dyn SignalManager>),
}

impl<T: Send + 'static> Component<T> {
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Process(_) => "ProcessManager",
            Component::Stage(_) => "StageManager",
            Component::Event(_) => "EventManager",
            Component::Signal(_) => "SignalManager",
        }
    }
}

impl<T: Send + 'static> fmt::Debug for Component<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.kind())
    }
}

/// Process, stage, event and signal managers.
pub struct ComponentSet<T: Send + 'static> {
    process_manager: Option<Arc<dyn ProcessManager<T>>>,
    stage_manager: Option<Arc<dyn StageManager>>,
    event_manager: Option<Arc<dyn EventManager>>,
    signal_manager: Option<Arc<dyn SignalManager>>,
}

impl<T> ComponentSet<T>
where
    T: Send + Sync + 'static,
{
    /// An empty set; every manager is absent.
    pub fn new() -> Self {
        Self {
            process_manager: None,
            stage_manager: None,
            event_manager: None,
            signal_manager: None,
        }
    }

    /// The default in-memory tables plus an OS signal manager forwarding
    /// into `ctl`.
    pub fn with_defaults(ctl: Arc<ChannelBase<String>>) -> Self {
        Self::new()
            .with_process_manager(Arc::new(ProcessTable::new()))
            .with_stage_manager(Arc::new(StageTable::new()))
            .with_event_manager(Arc::new(EventTable::new()))
            .with_signal_manager(Arc::new(OsSignalManager::new(ctl)))
    }

    pub fn with_process_manager(mut self, manager: Arc<dyn ProcessManager<T>>) -> Self {
        self.process_manager = Some(manager);
        self
    }

    pub fn with_stage_manager(mut self, manager: Arc<dyn StageManager>) -> Self {
        self.stage_manager = Some(manager);
        self
    }

    pub fn with_event_manager(mut self, manager: Arc<dyn EventManager>) -> Self {
        self.event_manager = Some(manager);
        self
    }

    pub fn with_signal_manager(mut self, manager: Arc<dyn SignalManager>) -> Self {
        self.signal_manager = Some(manager);
        self
    }

    pub fn process_manager(&self) -> Option<Arc<dyn ProcessManager<T>>> {
        self.process_manager.clone()
    }

    pub fn stage_manager(&self) -> Option<Arc<dyn StageManager>> {
        self.stage_manager.clone()
    }

    pub fn event_manager(&self) -> Option<Arc<dyn EventManager>> {
        self.event_manager.clone()
    }

    pub fn signal_manager(&self) -> Option<Arc<dyn SignalManager>> {
        self.signal_manager.clone()
    }

    /// Look up a manager by name (`"process"` or `"process_manager"`, etc.).
    pub fn get_component(&self, name: &str) -> Option<Component<T>> {
        match name {
            "process" | "process_manager" => self.process_manager().map(Component::Process),
            "stage" | "stage_manager" => self.stage_manager().map(Component::Stage),
            "event" | "event_manager" => self.event_manager().map(Component::Event),
            "signal" | "signal_manager" => self.signal_manager().map(Component::Signal),
            _ => None,
        }
    }

    /// Names of the managers that are absent.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.process_manager.is_none() {
            missing.push("ProcessManager");
        }
        if self.event_manager.is_none() {
            missing.push("EventManager");
        }
        if self.stage_manager.is_none() {
            missing.push("StageManager");
        }
        if self.signal_manager.is_none() {
            missing.push("SignalManager");
        }
        missing
    }
}

impl<T: Send + Sync + 'static> Default for ComponentSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Clone for ComponentSet<T> {
    fn clone(&self) -> Self {
        Self {
            process_manager: self.process_manager.clone(),
            stage_manager: self.stage_manager.clone(),
            event_manager: self.event_manager.clone(),
            signal_manager: self.signal_manager.clone(),
        }
    }
}
