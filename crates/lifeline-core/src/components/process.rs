//! In-memory process table.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use lifeline_protocols::{ManagerError, ProcessInput, ProcessManager};

use crate::registry::BaseRegistry;

/// Keyed process inputs. The current process is the one added last.
pub struct ProcessTable<T: Send + 'static> {
    processes: BaseRegistry<dyn ProcessInput<T>>,
    current: RwLock<Option<String>>,
}

impl<T: Send + 'static> ProcessTable<T> {
    pub fn new() -> Self {
        Self {
            processes: BaseRegistry::new("Process"),
            current: RwLock::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

impl<T: Send + 'static> Default for ProcessTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> ProcessManager<T> for ProcessTable<T> {
    fn get_process(&self, name: &str) -> Result<Arc<dyn ProcessInput<T>>, ManagerError> {
        self.processes.require(name)
    }

    fn add_process(
        &self,
        name: &str,
        process: Arc<dyn ProcessInput<T>>,
    ) -> Result<(), ManagerError> {
        self.processes.register(name, process)?;
        *self.current.write() = Some(name.to_string());
        debug!("Process {} added", name);
        Ok(())
    }

    fn remove_process(&self, name: &str) -> Result<(), ManagerError> {
        self.processes.unregister(name)?;
        let mut current = self.current.write();
        if current.as_deref() == Some(name) {
            *current = self.processes.any().map(|(key, _)| key);
        }
        debug!("Process {} removed", name);
        Ok(())
    }

    fn current_process(&self) -> Option<Arc<dyn ProcessInput<T>>> {
        let current = self.current.read().clone();
        current
            .and_then(|name| self.processes.get(&name))
            .or_else(|| self.processes.any().map(|(_, process)| process))
    }

    fn list_processes(&self) -> Vec<String> {
        self.processes.keys()
    }
}
