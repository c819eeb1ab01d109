//! lifeline - reactive component runtime
//!
//! Main entry point for the lifeline CLI.

mod cli;
mod cmd_config;
mod cmd_run;
mod logging;

use clap::Parser;

use lifeline_config::ConfigLoader;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let path = cli.config.unwrap_or_else(ConfigLoader::default_path);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = ConfigLoader::load_or_default(&path)?;
            logging::init_tracing(&config.logging)?;
            tracing::info!("Configuration: {}", path.display());
            cmd_run::run(config).await
        }
        Commands::Validate => cmd_config::validate(&path),
        Commands::Init { force } => cmd_config::init(&path, force),
    }
}
