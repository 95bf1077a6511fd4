//! Command-line interface for aeneas.
//!
//! This module provides the CLI structure for the `aeneas` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{CleanUpCommand, ConfigCommand, ServeCommand, StatusCommand};

/// aeneas - Collect crash and diagnostic reports
///
/// An HTTP service that accepts JSON reports from client applications,
/// stores them, and serves them back as JSON or HTML.
#[derive(Debug, Parser)]
#[command(name = "aeneas")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Write every stored report's id into its raw payload
    CleanUp(CleanUpCommand),

    /// Show database status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn status_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "aeneas");
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(status_cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(status_cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(status_cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let args = vec![
            "aeneas",
            "serve",
            "--port",
            "8080",
            "--debug",
            "--max-content-length",
            "100",
            "--database",
            "sqlite:///run_tests.db",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Serve(serve) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(serve.port, Some(8080));
        assert!(serve.debug);
        assert_eq!(serve.max_content_length, Some(100));
        assert_eq!(serve.database.as_deref(), Some("sqlite:///run_tests.db"));
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(vec!["aeneas", "serve"]).unwrap();
        let Command::Serve(serve) = cli.command else {
            panic!("expected serve command");
        };
        assert!(serve.port.is_none());
        assert!(!serve.debug);
    }

    #[test]
    fn test_parse_clean_up() {
        let cli = Cli::try_parse_from(vec!["aeneas", "clean-up", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::CleanUp(CleanUpCommand { json: true })
        ));
    }

    #[test]
    fn test_parse_status() {
        let cli = Cli::try_parse_from(vec!["aeneas", "status"]).unwrap();
        assert!(matches!(cli.command, Command::Status(_)));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli =
            Cli::try_parse_from(vec!["aeneas", "config", "validate", "-f", "a.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["aeneas", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(vec!["aeneas", "serve", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_with_quiet() {
        let cli = Cli::try_parse_from(vec!["aeneas", "-q", "status"]).unwrap();
        assert!(cli.quiet);
    }
}
