//! OS signal forwarding into the control plane.
//!
//! SIGTERM, SIGINT and SIGHUP (Ctrl+C elsewhere) are turned into control
//! messages on a `ctl` channel. The orchestrator's consumer decides what each
//! signal means.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use lifeline_protocols::{ChannelError, ManagerError, SignalManager};

use crate::channel::ChannelBase;
use crate::registry::{control_message, ChannelRegistry, CTL};

const CONTEXT: &str = "SignalManager";

/// Signal manager backed by `tokio::signal`.
pub struct OsSignalManager {
    ctl: Arc<ChannelBase<String>>,
    listening: Mutex<Option<CancellationToken>>,
}

impl OsSignalManager {
    pub fn new(ctl: Arc<ChannelBase<String>>) -> Self {
        Self {
            ctl,
            listening: Mutex::new(None),
        }
    }

    /// Forward into the `ctl` channel of `registry`.
    pub fn from_registry<T>(registry: &ChannelRegistry<T>) -> Result<Self, ChannelError> {
        registry
            .lookup_text(CTL)
            .map(Self::new)
            .ok_or_else(|| ChannelError::NotFound(CTL.to_string()))
    }

    #[cfg(unix)]
    fn install(&self, handle: &Handle, token: &CancellationToken) -> Result<(), ManagerError> {
        use tokio::signal::unix::{signal, SignalKind};

        let signals = [
            (SignalKind::terminate(), "SIGTERM"),
            (SignalKind::interrupt(), "SIGINT"),
            (SignalKind::hangup(), "SIGHUP"),
        ];

        for (kind, label) in signals {
            let mut stream = {
                let _guard = handle.enter();
                signal(kind).map_err(|e| ManagerError::SignalSetup(e.to_string()))?
            };
            let ctl = self.ctl.clone();
            let token = token.clone();
            handle.spawn(async move {
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        received = stream.recv() => match received {
                            Some(()) => {
                                info!("Received {}", label);
                                relay(&ctl, label);
                            }
                            None => break,
                        },
                    }
                }
            });
        }

        info!("Signal listeners installed (SIGTERM, SIGINT, SIGHUP)");
        Ok(())
    }

    #[cfg(not(unix))]
    fn install(&self, handle: &Handle, token: &CancellationToken) -> Result<(), ManagerError> {
        let ctl = self.ctl.clone();
        let token = token.clone();
        handle.spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    result = tokio::signal::ctrl_c() => match result {
                        Ok(()) => {
                            info!("Received Ctrl+C");
                            relay(&ctl, "SIGINT");
                        }
                        Err(e) => {
                            warn!("Ctrl+C listener failed: {}", e);
                            break;
                        }
                    },
                }
            }
        });

        info!("Signal listener installed (Ctrl+C)");
        Ok(())
    }
}

impl SignalManager for OsSignalManager {
    fn listen_for_signals(&self) -> Result<(), ManagerError> {
        let handle = Handle::try_current().map_err(|e| ManagerError::SignalSetup(e.to_string()))?;

        let mut listening = self.listening.lock();
        if listening.is_some() {
            return Ok(());
        }

        let token = CancellationToken::new();
        if let Err(e) = self.install(&handle, &token) {
            token.cancel();
            return Err(e);
        }
        *listening = Some(token);
        Ok(())
    }

    fn stop_listening(&self) {
        if let Some(token) = self.listening.lock().take() {
            token.cancel();
            info!("Signal listeners stopped");
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.lock().is_some()
    }

    fn forward(&self, signal: &str) -> Result<(), ChannelError> {
        self.ctl.try_send(control_message(CONTEXT, signal))
    }
}

impl Drop for OsSignalManager {
    fn drop(&mut self) {
        if let Some(token) = self.listening.get_mut().take() {
            token.cancel();
        }
    }
}

fn relay(ctl: &ChannelBase<String>, signal: &str) {
    if let Err(e) = ctl.try_send(control_message(CONTEXT, signal)) {
        warn!("Failed to forward {} to {}: {}", signal, ctl.name(), e);
    }
}
