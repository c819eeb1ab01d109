//! Channel errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Channel not found: {0}")]
    NotFound(String),

    #[error("Channel {name} carries {found}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Channel buffer full: {0}")]
    Full(String),

    #[error("Channel closed: {0}")]
    Closed(String),

    #[error("Channel already closed: {0}")]
    AlreadyClosed(String),

    #[error("Receive cancelled")]
    Cancelled,
}
