//! CLI definitions for lifeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// lifeline CLI.
#[derive(Parser)]
#[command(name = "lifeline")]
#[command(about = "Reactive component runtime")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults to ~/.lifeline/config.toml)
    #[arg(short, long, env = "LIFELINE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Start the lifecycle and serve control messages until shut down (default)
    Run,

    /// Check the configuration file and report problems
    Validate,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["lifeline"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_init_force() {
        let cli = Cli::try_parse_from(["lifeline", "--config", "/tmp/l.toml", "init", "--force"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/l.toml")));
        assert!(matches!(cli.command, Some(Commands::Init { force: true })));
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["lifeline", "validate", "-c", "x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Some(Commands::Validate)));
    }
}
