//! Channel-backed process input.
//!
//! [`ControlledProcess`] carries commands for one managed process over a
//! bounded queue. It does not spawn OS processes; whoever drains the queue
//! decides what a command means.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use lifeline_protocols::{
    ChannelError, Format, FormatError, ProcessConfig, ProcessInput, PropertyError, SendCallback,
    ValidationResult,
};

use crate::channel::{ChannelBase, LARGE_BUFFER};
use crate::codec;
use crate::sync::LockSet;

/// Process input whose commands travel over a [`ChannelBase`].
pub struct ControlledProcess<T> {
    config: Arc<LockSet<ProcessConfig>>,
    commands: Arc<ChannelBase<T>>,
}

impl<T> ControlledProcess<T>
where
    T: From<String> + Clone + Send + Sync + 'static,
{
    pub fn new(config: ProcessConfig) -> Self {
        Self::with_capacity(config, LARGE_BUFFER)
    }

    pub fn with_capacity(config: ProcessConfig, capacity: usize) -> Self {
        let commands = Arc::new(ChannelBase::new(config.name.clone(), capacity));
        Self {
            config: Arc::new(LockSet::new(config)),
            commands,
        }
    }

    pub fn config(&self) -> ProcessConfig {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: ProcessConfig) {
        self.commands.set_name(config.name.clone());
        *self.config.write() = config;
    }

    /// The command queue, for consumers that drain it directly.
    pub fn commands(&self) -> Arc<ChannelBase<T>> {
        self.commands.clone()
    }

    /// Number of receive loops still running.
    pub fn active_receivers(&self) -> usize {
        self.config.pending()
    }
}

#[async_trait]
impl<T> ProcessInput<T> for ControlledProcess<T>
where
    T: From<String> + Clone + Send + Sync + 'static,
{
    fn name(&self) -> String {
        self.config.read().name.clone()
    }

    fn send(&self, command: &str, callback: Option<SendCallback<T>>) -> Result<(), ChannelError> {
        let value = T::from(command.to_string());
        self.commands.try_send(value.clone())?;
        debug!("Process {} queued command {}", self.name(), command);
        if let Some(callback) = callback {
            callback(&value);
        }
        Ok(())
    }

    async fn receive(
        &self,
        cancel: CancellationToken,
        callback: Option<SendCallback<T>>,
    ) -> Result<T, ChannelError> {
        let (relay_tx, mut relay_rx) = mpsc::channel::<T>(1);
        let commands = self.commands.clone();
        let locks = self.config.clone();
        let stop = cancel.clone();

        locks.add(1);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    message = commands.recv() => match message {
                        Some(value) => {
                            if let Some(callback) = &callback {
                                callback(&value);
                            }
                            // Only the first value is awaited by the caller.
                            let _ = relay_tx.try_send(value);
                        }
                        None => break,
                    },
                }
            }
            debug!("Receive loop on {} finished", commands.name());
            locks.done();
        });

        match relay_rx.recv().await {
            Some(value) => Ok(value),
            None if cancel.is_cancelled() => Err(ChannelError::Cancelled),
            None => Err(ChannelError::Closed(self.commands.name())),
        }
    }

    fn serialize(&self, format: Format) -> Result<Vec<u8>, FormatError> {
        codec::encode(&*self.config.read(), format)
    }

    fn deserialize(&self, data: &[u8], format: Format) -> Result<(), FormatError> {
        let config: ProcessConfig = codec::decode(data, format)?;
        self.set_config(config);
        Ok(())
    }

    fn save_to_file(&self, path: &Path, format: Format) -> Result<(), PropertyError> {
        codec::write_file(path, &*self.config.read(), format)
    }

    fn load_from_file(&self, path: &Path, format: Format) -> Result<(), PropertyError> {
        let config: ProcessConfig = codec::read_file(path, format)?;
        self.set_config(config);
        Ok(())
    }

    fn validate(&self) -> ValidationResult {
        let config = self.config.read();
        let mut failures = Vec::new();
        if config.name.is_empty() {
            failures.push("Process name is empty".to_string());
        }
        if config.command.is_empty() {
            failures.push("Process command is empty".to_string());
        }
        if config.path.is_empty() {
            failures.push("Process path is empty".to_string());
        }
        if config.process_type.is_empty() {
            failures.push("Process type is empty".to_string());
        }
        ValidationResult::from_failures("Process input is invalid:", &failures)
    }
}
