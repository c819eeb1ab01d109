//! Lifecycle orchestrator errors.

use thiserror::Error;

use super::{ChannelError, ManagerError, PropertyError};

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Aggregated structural validation failure, one failed invariant per line.
    #[error("{0}")]
    Invalid(String),

    #[error("Configuration not set")]
    ConfigMissing,

    #[error("{0} not found")]
    ComponentNotFound(String),

    #[error("Cannot {action} from state {state}")]
    InvalidState { state: String, action: &'static str },

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Manager error: {0}")]
    Manager(#[from] ManagerError),

    #[error("Property error: {0}")]
    Property(#[from] PropertyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_not_found_error() {
        let err = LifecycleError::ComponentNotFound("ProcessManager".to_string());
        assert_eq!(err.to_string(), "ProcessManager not found");
    }

    #[test]
    fn test_invalid_error_keeps_lines() {
        let err = LifecycleError::Invalid("Lifecycle is invalid:\nA\nB".to_string());
        assert_eq!(err.to_string().lines().count(), 3);
    }

    #[test]
    fn test_invalid_state_error() {
        let err = LifecycleError::InvalidState {
            state: "uninitialized".to_string(),
            action: "stop",
        };
        assert_eq!(err.to_string(), "Cannot stop from state uninitialized");
    }

    #[test]
    fn test_from_channel_error() {
        let err = LifecycleError::from(ChannelError::Full("ctl".to_string()));
        assert!(err.to_string().contains("buffer full"));
    }

    #[test]
    fn test_all_error_variants_display() {
        let errors: Vec<LifecycleError> = vec![
            LifecycleError::Invalid("x".to_string()),
            LifecycleError::ConfigMissing,
            LifecycleError::ComponentNotFound("StageManager".to_string()),
            LifecycleError::Manager(ManagerError::not_found("Stage", "s")),
            LifecycleError::Property(PropertyError::Rejected("r".to_string())),
        ];
        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
