//! `lifeline run`: start the lifecycle and serve the control channel.

use std::sync::Arc;

use anyhow::{bail, Context};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use lifeline_config::{ConfigValidator, RuntimeConfig};
use lifeline_core::registry::CTL;
use lifeline_core::{
    BufferSizes, ChannelRegistry, ComponentSet, ControlledProcess, EventTable, Lifecycle,
    OsSignalManager, ProcessTable, StageTable,
};
use lifeline_protocols::{
    Event, EventManager, ProcessInput, ProcessManager, SendCallback, SignalManager, Stage,
    StageManager,
};

const RUNNING_STAGE: &str = "running";
const SHUTDOWN_EVENT: &str = "shutdown";

/// What a control message asks the runner to do.
#[derive(Debug, PartialEq, Eq)]
enum Directive {
    Restart,
    Shutdown,
    Ignore,
}

fn directive(message: &str) -> Directive {
    let parsed: serde_json::Value = match serde_json::from_str(message) {
        Ok(value) => value,
        Err(_) => return Directive::Ignore,
    };
    match parsed.get("message").and_then(|m| m.as_str()) {
        Some("SIGHUP") => Directive::Restart,
        Some("SIGTERM") | Some("SIGINT") => Directive::Shutdown,
        _ => Directive::Ignore,
    }
}

pub(crate) async fn run(config: RuntimeConfig) -> anyhow::Result<()> {
    let report = ConfigValidator::validate(&config);
    for warning in &report.warnings {
        warn!("{}: {}", warning.path, warning.message);
    }
    for problem in &report.errors {
        error!("{}: {}", problem.path, problem.message);
    }
    if !report.is_valid() {
        bail!("configuration has {} error(s)", report.errors.len());
    }

    let name = config.runtime.name.clone();
    info!("Starting lifeline v{} as {}", env!("CARGO_PKG_VERSION"), name);

    let sizes = BufferSizes {
        small: config.channels.small,
        medium: config.channels.medium,
        large: config.channels.large,
    };
    let plane: Arc<ChannelRegistry<String>> = Arc::new(ChannelRegistry::new(name.clone()));
    plane
        .with_buffer_sizes(sizes)
        .with_metrics(config.runtime.metrics)
        .with_buffer_size(sizes.large);

    let ctl = plane
        .lookup_text(CTL)
        .context("control plane has no ctl channel")?;
    let signals = Arc::new(OsSignalManager::new(ctl.clone()));

    let worker = Arc::new(ControlledProcess::<String>::with_capacity(
        config.process.clone(),
        sizes.large,
    ));
    let processes: Arc<ProcessTable<String>> = Arc::new(ProcessTable::new());
    let process_name = if config.process.name.is_empty() {
        name.clone()
    } else {
        config.process.name.clone()
    };
    processes.add_process(&process_name, worker.clone())?;

    let stages = Arc::new(StageTable::new());
    stages.add_stage(Stage::new(RUNNING_STAGE).with_type("runtime"))?;
    stages.set_current_stage(RUNNING_STAGE)?;

    let events = Arc::new(EventTable::new());
    events.add_event(Event::new(SHUTDOWN_EVENT).with_description("Runtime shutdown"))?;

    let components = ComponentSet::new()
        .with_process_manager(processes)
        .with_stage_manager(stages)
        .with_event_manager(events)
        .with_signal_manager(signals.clone());

    let input: Arc<dyn ProcessInput<String>> = worker.clone();
    let mut lifecycle = Lifecycle::with_control_plane(name.clone(), Some(input), components, plane)
        .with_shutdown_targets(
            config.lifecycle.shutdown_stage.clone(),
            config
                .lifecycle
                .shutdown_event
                .clone()
                .or_else(|| Some(SHUTDOWN_EVENT.to_string())),
        );
    if let Some((path, format)) = config.lifecycle.persistence()? {
        info!("Persisting process configuration to {} ({})", path.display(), format);
        lifecycle = lifecycle.with_persistence(path, format);
    }

    if let Err(e) = lifecycle.validate_config() {
        warn!("{}", e);
    }

    let cancel = CancellationToken::new();
    spawn_worker(worker.clone(), cancel.clone());

    lifecycle.start_lifecycle()?;
    signals.listen_for_signals()?;
    info!("Lifecycle {} is {}", name, lifecycle.state());

    while let Some(message) = ctl.recv().await {
        info!("ctl: {}", message);
        match directive(&message) {
            Directive::Restart => {
                if let Err(e) = lifecycle.restart_lifecycle() {
                    error!("Restart failed: {}", e);
                }
            }
            Directive::Shutdown => break,
            Directive::Ignore => {}
        }
    }

    let result = lifecycle.shutdown();
    cancel.cancel();
    // Drain anything published during shutdown.
    while let Some(message) = ctl.try_recv() {
        info!("ctl: {}", message);
    }
    result?;

    info!("Lifecycle {} is {}", name, lifecycle.state());
    Ok(())
}

/// Consume the worker's command queue, logging each command.
fn spawn_worker(worker: Arc<ControlledProcess<String>>, cancel: CancellationToken) {
    let label = worker.name();
    let log: SendCallback<String> = Arc::new(move |command: &String| {
        info!("Process {} received {}", label, command);
    });
    tokio::spawn(async move {
        match worker.receive(cancel, Some(log)).await {
            Ok(first) => debug!("Process {} first command: {}", worker.name(), first),
            Err(e) => debug!("Process {} receive ended: {}", worker.name(), e),
        }
    });
}
