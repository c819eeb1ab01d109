//! Lifecycle orchestration.
//!
//! A [`Lifecycle`] owns a control-plane [`ChannelRegistry`], a configuration
//! [`Property`] holding the current process input, and a [`ComponentSet`].
//! Every transition is admitted only after the structural checks in
//! [`Lifecycle::validate_lifecycle`] pass.
//!
//! ```text
//! Uninitialized -> Initialized -> Running -> Stopped -> ShuttingDown -> Terminated
//!                                        (Invalid is absorbing)
//! ```
//!
//! Commands reach downstream consumers through the `ctl` sub-channel. The
//! state lock is never held while a command is handed to a process input.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use lifeline_protocols::{
    Format, LifecycleError, ProcessInput, PropertyError, Reference, SendCallback,
    ValidationResult, Validator,
};

use crate::components::{Component, ComponentSet};
use crate::property::Property;
use crate::registry::{ChannelKind, ChannelRegistry, CTL};
use crate::sync::LockSet;

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

const INVALID_HEADER: &str = "Lifecycle is invalid:";

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// Constructed, not yet validated.
    Uninitialized = 0,
    /// Structural checks passed.
    Initialized = 1,
    /// `start` was delivered.
    Running = 2,
    /// Sub-managers quiesced; can be started again.
    Stopped = 3,
    /// Shutdown in progress (or failed part-way).
    ShuttingDown = 4,
    /// Shut down.
    Terminated = 5,
    /// Failed structural validation. Absorbing.
    Invalid = 6,
}

impl From<u8> for LifecycleState {
    fn from(v: u8) -> Self {
        match v {
            0 => LifecycleState::Uninitialized,
            1 => LifecycleState::Initialized,
            2 => LifecycleState::Running,
            3 => LifecycleState::Stopped,
            4 => LifecycleState::ShuttingDown,
            5 => LifecycleState::Terminated,
            _ => LifecycleState::Invalid,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Running => "running",
            LifecycleState::Stopped => "stopped",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Terminated => "terminated",
            LifecycleState::Invalid => "invalid",
        };
        f.write_str(label)
    }
}

type ConfigCell<T> = Property<Arc<dyn ProcessInput<T>>>;
type ConfigValidator<T> = Arc<dyn Validator<Arc<dyn ProcessInput<T>>>>;

struct Inner<T: Send + 'static> {
    state: LifecycleState,
    config: Option<ConfigCell<T>>,
    metadata: Option<HashMap<String, serde_json::Value>>,
}

/// Finite-state controller over a process input and its sub-managers.
pub struct Lifecycle<T: Send + 'static> {
    reference: Reference,
    inner: LockSet<Inner<T>>,
    control_plane: Arc<ChannelRegistry<T>>,
    components: ComponentSet<T>,
    shutdown_stage: Option<String>,
    shutdown_event: Option<String>,
    persistence: Option<(PathBuf, Format)>,
    config_validator: Option<ConfigValidator<T>>,
}

impl<T> Lifecycle<T>
where
    T: Clone + Send + Sync + fmt::Display + 'static,
{
    /// Create a lifecycle with its own control plane.
    pub fn new(
        name: impl Into<String>,
        input: Option<Arc<dyn ProcessInput<T>>>,
        components: ComponentSet<T>,
    ) -> Self {
        let name = name.into();
        let control_plane = Arc::new(ChannelRegistry::new(name.clone()));
        Self::with_control_plane(name, input, components, control_plane)
    }

    /// Create a lifecycle on a caller-provided control plane.
    ///
    /// Without an input, or when the registry has no text `ctl` channel, the
    /// instance starts in [`LifecycleState::Invalid`].
    pub fn with_control_plane(
        name: impl Into<String>,
        input: Option<Arc<dyn ProcessInput<T>>>,
        components: ComponentSet<T>,
        control_plane: Arc<ChannelRegistry<T>>,
    ) -> Self {
        let name = name.into();
        let ctl_ok = matches!(
            control_plane.lookup_sub_channel(CTL),
            Some((_, ChannelKind::Text))
        );

        let state = if input.is_none() {
            warn!("Lifecycle {} created without configuration", name);
            LifecycleState::Invalid
        } else if !ctl_ok {
            warn!("Lifecycle {} control plane has no usable ctl channel", name);
            LifecycleState::Invalid
        } else {
            LifecycleState::Uninitialized
        };

        let config = input.map(|input| Property::new(format!("{}-config", name), input, false, None));

        Self {
            reference: Reference::new(name),
            inner: LockSet::new(Inner {
                state,
                config,
                metadata: None,
            }),
            control_plane,
            components,
            shutdown_stage: None,
            shutdown_event: None,
            persistence: None,
            config_validator: None,
        }
    }

    /// Stage and event removed when quiescing. Without a stage the current
    /// stage is used; without an event none is removed.
    pub fn with_shutdown_targets(mut self, stage: Option<String>, event: Option<String>) -> Self {
        self.shutdown_stage = stage;
        self.shutdown_event = event;
        self
    }

    /// Gate every configuration change through `validator`.
    pub fn with_config_validator(mut self, validator: ConfigValidator<T>) -> Self {
        {
            let mut inner = self.inner.write();
            inner.config = inner
                .config
                .take()
                .map(|config| config.with_validator(validator.clone()));
        }
        self.config_validator = Some(validator);
        self
    }

    /// Persist the configuration to `path` on every `set_config` and refresh
    /// it from there on every `get_config`.
    pub fn with_persistence(mut self, path: impl Into<PathBuf>, format: Format) -> Self {
        self.persistence = Some((path.into(), format));
        self
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.read().state
    }

    pub fn control_plane(&self) -> Arc<ChannelRegistry<T>> {
        self.control_plane.clone()
    }

    pub fn components(&self) -> &ComponentSet<T> {
        &self.components
    }

    pub fn get_component(&self, name: &str) -> Option<Component<T>> {
        self.components.get_component(name)
    }

    /// Check every structural invariant and report all failures at once.
    pub fn validate_lifecycle(&self) -> ValidationResult {
        let inner = self.inner.read();
        self.validate_locked(&inner)
    }

    fn validate_locked(&self, inner: &Inner<T>) -> ValidationResult {
        let mut failures = Vec::new();
        if inner.config.is_none() {
            failures.push("Configuration is missing".to_string());
        }
        match self.control_plane.lookup_sub_channel(CTL) {
            Some((_, ChannelKind::Text)) => {}
            Some((_, kind)) => failures.push(format!("Control channel carries {}, expected text", kind)),
            None => failures.push("Control channel is missing".to_string()),
        }
        let missing = self.components.missing();
        if missing.len() == 4 {
            failures.push("Components are empty".to_string());
        }
        for component in missing {
            failures.push(format!("{} is missing", component));
        }
        if !self.reference.is_valid() {
            failures.push("Lifecycle reference is invalid".to_string());
        }
        ValidationResult::from_failures(INVALID_HEADER, &failures)
    }

    /// Failure message for an instance in [`LifecycleState::Invalid`].
    fn invalid_message(&self, inner: &Inner<T>) -> String {
        let verdict = self.validate_locked(inner);
        if verdict.is_valid {
            format!("{}\nLifecycle was marked invalid", INVALID_HEADER)
        } else {
            verdict.message
        }
    }

    /// Validate and move to [`LifecycleState::Initialized`].
    pub fn initialize(&self) -> Result<(), LifecycleError> {
        let mut inner = self.inner.write();
        self.initialize_locked(&mut inner)
    }

    fn initialize_locked(&self, inner: &mut Inner<T>) -> Result<(), LifecycleError> {
        match inner.state {
            LifecycleState::Uninitialized
            | LifecycleState::Initialized
            | LifecycleState::Stopped => {}
            LifecycleState::Invalid => {
                return Err(LifecycleError::Invalid(self.invalid_message(inner)));
            }
            state => {
                return Err(LifecycleError::InvalidState {
                    state: state.to_string(),
                    action: "initialize",
                });
            }
        }

        if inner.config.is_none() {
            inner.state = LifecycleState::Invalid;
            return Err(LifecycleError::ConfigMissing);
        }

        let verdict = self.validate_locked(inner);
        if !verdict.is_valid {
            error!("Lifecycle {} failed validation:\n{}", self.name(), verdict.message);
            inner.state = LifecycleState::Invalid;
            return Err(LifecycleError::Invalid(verdict.message));
        }

        inner.metadata.get_or_insert_with(HashMap::new);
        if inner.state != LifecycleState::Initialized {
            info!("Lifecycle {} initialized", self.name());
        }
        inner.state = LifecycleState::Initialized;
        Ok(())
    }

    /// Re-initialize, send `"start"` through the configured process input
    /// and move to [`LifecycleState::Running`].
    pub fn start_lifecycle(&self) -> Result<(), LifecycleError> {
        let input = {
            let mut inner = self.inner.write();
            if inner.state == LifecycleState::Running {
                return Err(LifecycleError::InvalidState {
                    state: inner.state.to_string(),
                    action: "start",
                });
            }
            self.initialize_locked(&mut inner)?;
            match &inner.config {
                Some(config) => config.get_value(),
                None => return Err(LifecycleError::ConfigMissing),
            }
        };

        if let Err(e) = input.send("start", Some(self.control_relay())) {
            error!("Lifecycle {} failed to send start to {}: {}", self.name(), input.name(), e);
            return Err(e.into());
        }

        let mut inner = self.inner.write();
        if inner.state != LifecycleState::Initialized {
            warn!(
                "Lifecycle {} moved to {} while starting",
                self.name(),
                inner.state
            );
            return Err(LifecycleError::InvalidState {
                state: inner.state.to_string(),
                action: "start",
            });
        }
        inner.state = LifecycleState::Running;
        info!("Lifecycle {} running", self.name());
        Ok(())
    }

    /// Quiesce the sub-managers and move to [`LifecycleState::Stopped`].
    pub fn stop_lifecycle(&self) -> Result<(), LifecycleError> {
        {
            let inner = self.inner.read();
            match inner.state {
                LifecycleState::Initialized | LifecycleState::Running => {}
                state => {
                    return Err(LifecycleError::InvalidState {
                        state: state.to_string(),
                        action: "stop",
                    });
                }
            }
        }

        self.quiesce()?;

        // Another transition may have run while the sub-managers were quiesced.
        let mut inner = self.inner.write();
        match inner.state {
            LifecycleState::Initialized | LifecycleState::Running => {}
            state => {
                warn!("Lifecycle {} moved to {} while stopping", self.name(), state);
                return Err(LifecycleError::InvalidState {
                    state: state.to_string(),
                    action: "stop",
                });
            }
        }
        inner.state = LifecycleState::Stopped;
        info!("Lifecycle {} stopped", self.name());
        Ok(())
    }

    /// Stop, then start. Fails without starting if the stop fails.
    pub fn restart_lifecycle(&self) -> Result<(), LifecycleError> {
        self.stop_lifecycle()?;
        self.start_lifecycle()
    }

    /// Quiesce the sub-managers, stop the signal listener, close the control
    /// plane and move to [`LifecycleState::Terminated`].
    ///
    /// Completed steps are not rolled back when a later one fails; the
    /// state then stays [`LifecycleState::ShuttingDown`].
    pub fn shutdown(&self) -> Result<(), LifecycleError> {
        {
            let mut inner = self.inner.write();
            match inner.state {
                LifecycleState::Terminated => {
                    return Err(LifecycleError::InvalidState {
                        state: inner.state.to_string(),
                        action: "shut down",
                    });
                }
                LifecycleState::Invalid => {
                    return Err(LifecycleError::Invalid(self.invalid_message(&inner)));
                }
                _ => inner.state = LifecycleState::ShuttingDown,
            }
        }
        info!("Lifecycle {} shutting down", self.name());

        self.quiesce()?;

        let mut inner = self.inner.write();
        if inner.state != LifecycleState::ShuttingDown {
            warn!(
                "Lifecycle {} moved to {} while shutting down",
                self.name(),
                inner.state
            );
            return Err(LifecycleError::InvalidState {
                state: inner.state.to_string(),
                action: "shut down",
            });
        }
        if let Some(signals) = self.components.signal_manager() {
            signals.stop_listening();
        }
        if let Err(e) = self.control_plane.close() {
            warn!("Lifecycle {} control plane close: {}", self.name(), e);
        }
        inner.state = LifecycleState::Terminated;
        info!("Lifecycle {} terminated", self.name());
        Ok(())
    }

    /// `"not initialized"` when no configuration is set, `"running"`
    /// otherwise. Use [`state`](Self::state) for the actual state.
    pub fn status_lifecycle(&self) -> &'static str {
        if self.inner.read().config.is_none() {
            "not initialized"
        } else {
            "running"
        }
    }

    /// Current process input. With persistence enabled it is refreshed from
    /// the file first.
    pub fn get_config(&self) -> Option<Arc<dyn ProcessInput<T>>> {
        let input = self.inner.read().config.as_ref().map(|c| c.get_value())?;
        if let Some((path, format)) = &self.persistence {
            if path.exists() {
                if let Err(e) = input.load_from_file(path, *format) {
                    warn!("Failed to load configuration from {}: {}", path.display(), e);
                }
            }
        }
        Some(input)
    }

    /// Replace the process input and, once committed, persist it when
    /// enabled.
    pub fn set_config(&self, input: Arc<dyn ProcessInput<T>>) -> Result<(), LifecycleError> {
        let mut inner = self.inner.write();
        match &inner.config {
            Some(config) => {
                if !config.set_value(input.clone()) {
                    return Err(PropertyError::Rejected("configuration rejected".to_string()).into());
                }
            }
            None => {
                if let Some(validator) = &self.config_validator {
                    let verdict = validator.validate(&input);
                    if !verdict.is_valid {
                        return Err(PropertyError::Rejected(verdict.message).into());
                    }
                }
                let name = format!("{}-config", self.name());
                let mut config = Property::new(name, input.clone(), false, None);
                if let Some(validator) = &self.config_validator {
                    config = config.with_validator(validator.clone());
                }
                inner.config = Some(config);
            }
        }
        if let Some((path, format)) = &self.persistence {
            input
                .save_to_file(path, *format)
                .map_err(LifecycleError::Property)?;
        }
        if inner.state == LifecycleState::Invalid {
            warn!("Lifecycle {} stays invalid after configuration change", self.name());
        }
        Ok(())
    }

    /// Validate the configured process input.
    pub fn validate_config(&self) -> Result<(), LifecycleError> {
        let input = self
            .inner
            .read()
            .config
            .as_ref()
            .map(|c| c.get_value())
            .ok_or(LifecycleError::ConfigMissing)?;
        let verdict = input.validate();
        if verdict.is_valid {
            Ok(())
        } else {
            Err(LifecycleError::Invalid(verdict.message))
        }
    }

    pub fn metadata(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.read().metadata.as_ref()?.get(key).cloned()
    }

    pub fn set_metadata(&self, key: impl Into<String>, value: serde_json::Value) {
        self.inner
            .write()
            .metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
    }

    pub fn metadata_snapshot(&self) -> HashMap<String, serde_json::Value> {
        self.inner.read().metadata.clone().unwrap_or_default()
    }

    /// Send `"stop"` to the current process, then remove the designated
    /// stage and event. A missing manager aborts immediately.
    fn quiesce(&self) -> Result<(), LifecycleError> {
        let processes = self
            .components
            .process_manager()
            .ok_or_else(|| LifecycleError::ComponentNotFound("ProcessManager".to_string()))?;
        match processes.current_process() {
            Some(process) => {
                if let Err(e) = process.send("stop", Some(self.control_relay())) {
                    warn!("Failed to send stop to {}: {}", process.name(), e);
                }
            }
            None => debug!("Lifecycle {} has no current process to stop", self.name()),
        }

        let stages = self
            .components
            .stage_manager()
            .ok_or_else(|| LifecycleError::ComponentNotFound("StageManager".to_string()))?;
        let stage = self
            .shutdown_stage
            .clone()
            .or_else(|| stages.current_stage().map(|s| s.name));
        if let Some(stage) = stage {
            if let Err(e) = stages.remove_stage(&stage) {
                debug!("Stage {} not removed: {}", stage, e);
            }
        }

        let events = self
            .components
            .event_manager()
            .ok_or_else(|| LifecycleError::ComponentNotFound("EventManager".to_string()))?;
        if let Some(event) = &self.shutdown_event {
            if let Err(e) = events.remove_event(event) {
                debug!("Event {} not removed: {}", event, e);
            }
        }

        Ok(())
    }

    /// Callback forwarding a process input's value into `ctl`. Delivery
    /// failures are logged.
    fn control_relay(&self) -> SendCallback<T> {
        let plane = self.control_plane.clone();
        let context = self.reference.name.clone();
        Arc::new(move |message: &T| {
            if let Err(e) = plane.publish_control(&context, &message.to_string()) {
                error!("Failed to relay {} to the control plane of {}: {}", message, context, e);
            }
        })
    }
}

impl<T: Send + 'static> fmt::Debug for Lifecycle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("reference", &self.reference)
            .field("state", &self.inner.read().state)
            .finish()
    }
}
