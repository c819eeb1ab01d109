//! Process input protocol.
//!
//! A process input is the command carrier the lifecycle orchestrator drives:
//! it accepts textual commands (`"start"`, `"stop"`), exposes a cancellable
//! receive loop, and owns the persistence of its own configuration.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ChannelError, FormatError, PropertyError};
use crate::format::Format;
use crate::validation::ValidationResult;

/// Callback invoked with each value a process input emits.
pub type SendCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Serializable description of a managed process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub path: String,
    pub process_type: String,
    /// Names of processes that must be running before this one starts.
    pub wait_for: Vec<String>,
    pub restart: bool,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Command carrier consumed by the lifecycle orchestrator.
#[async_trait]
pub trait ProcessInput<T: Send + 'static>: Send + Sync {
    /// Name of the process this input drives.
    fn name(&self) -> String;

    /// Enqueue a command without blocking.
    ///
    /// The callback receives the value that was actually queued.
    fn send(&self, command: &str, callback: Option<SendCallback<T>>) -> Result<(), ChannelError>;

    /// Start the background receive loop and wait for its first value.
    ///
    /// The loop keeps forwarding every message to `callback` until `cancel`
    /// fires or the source closes.
    async fn receive(
        &self,
        cancel: CancellationToken,
        callback: Option<SendCallback<T>>,
    ) -> Result<T, ChannelError>;

    fn serialize(&self, format: Format) -> Result<Vec<u8>, FormatError>;

    fn deserialize(&self, data: &[u8], format: Format) -> Result<(), FormatError>;

    fn save_to_file(&self, path: &Path, format: Format) -> Result<(), PropertyError>;

    fn load_from_file(&self, path: &Path, format: Format) -> Result<(), PropertyError>;

    fn validate(&self) -> ValidationResult;
}
