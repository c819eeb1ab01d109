//! Tracing subscriber setup.

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lifeline_config::{ConfigLoader, LogFormat, LoggingConfig};

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the configured level. With a log directory set, a
/// plain-text copy goes to daily rolling files there.
pub(crate) fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let file_layer = match &config.directory {
        Some(directory) => {
            let directory = ConfigLoader::expand_path(&directory.to_string_lossy());
            std::fs::create_dir_all(&directory)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("lifeline")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&directory)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = GUARD.set(guard);
            Some(fmt::layer().with_writer(writer).with_ansi(false))
        }
        None => None,
    };

    let json = config.format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(env_filter)
        .with((!json).then(|| fmt::layer().with_target(true)))
        .with(json.then(|| fmt::layer().json()))
        .with(file_layer)
        .try_init()?;

    Ok(())
}
