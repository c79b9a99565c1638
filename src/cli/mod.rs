//! CLI module for the ledger server
//!
//! Provides command-line interface parsing for the ledger-server binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ledger - account and transfer API guarded by encrypted session tokens
#[derive(Parser, Debug)]
#[command(
    name = "ledger-server",
    version,
    about = "Ledger - account and transfer API guarded by encrypted session tokens",
    after_help = "EXAMPLES:\n    \
                  ledger-server                        # Start the server (reads ledger.toml)\n    \
                  ledger-server --config prod.toml     # Use a custom config file\n    \
                  ledger-server check-config           # Validate config and token key, then exit"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ledger.toml", global = true, env = "LEDGER_CONFIG")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Load and validate the configuration, including the token key, then exit
    CheckConfig,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ledger-server"]).unwrap();
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_check_config_with_custom_path() {
        let cli =
            Cli::try_parse_from(["ledger-server", "check-config", "--config", "prod.toml"]).unwrap();

        assert_eq!(cli.command, Some(Commands::CheckConfig));
        assert_eq!(cli.config, PathBuf::from("prod.toml"));
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["ledger-server", "init"]).is_err());
    }
}
