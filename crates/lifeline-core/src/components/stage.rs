//! In-memory stage table.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use lifeline_protocols::{ManagerError, Stage, StageManager};

use crate::registry::BaseRegistry;

/// Keyed stages plus a current-stage pointer.
pub struct StageTable {
    stages: BaseRegistry<Stage>,
    current: RwLock<Option<String>>,
}

impl StageTable {
    pub fn new() -> Self {
        Self {
            stages: BaseRegistry::new("Stage"),
            current: RwLock::new(None),
        }
    }

    /// Allow moving from stage `from` to stage `to`.
    pub fn add_transition(&self, from: &str, to: &str) -> Result<(), ManagerError> {
        let stored = self.stages.require(from)?;
        let mut stage = Stage::clone(&stored);
        stage.register_transition(to);
        self.stages.upsert(from, Arc::new(stage));
        Ok(())
    }

    pub fn list_stages(&self) -> Vec<String> {
        self.stages.keys()
    }
}

impl Default for StageTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StageManager for StageTable {
    fn get_stage(&self, name: &str) -> Result<Stage, ManagerError> {
        self.stages.require(name).map(|stage| Stage::clone(&stage))
    }

    fn add_stage(&self, stage: Stage) -> Result<(), ManagerError> {
        let name = stage.name.clone();
        self.stages.register(&name, Arc::new(stage))
    }

    fn remove_stage(&self, name: &str) -> Result<(), ManagerError> {
        self.stages.unregister(name)?;
        let mut current = self.current.write();
        if current.as_deref() == Some(name) {
            *current = None;
        }
        debug!("Stage {} removed", name);
        Ok(())
    }

    fn current_stage(&self) -> Option<Stage> {
        let current = self.current.read().clone()?;
        self.stages.get(&current).map(|stage| Stage::clone(&stage))
    }

    /// Move to `name`, honoring the transitions registered on the current stage.
    fn set_current_stage(&self, name: &str) -> Result<(), ManagerError> {
        self.stages.require(name)?;
        let mut current = self.current.write();
        if let Some(from) = current.as_deref().and_then(|c| self.stages.get(c)) {
            if !from.can_transition_to(name) {
                return Err(ManagerError::InvalidTransition {
                    from: from.name.clone(),
                    to: name.to_string(),
                });
            }
        }
        *current = Some(name.to_string());
        Ok(())
    }
}
