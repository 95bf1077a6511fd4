//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::Config;

/// Serve command arguments.
///
/// Every flag overrides the value loaded from the config file and environment.
#[derive(Debug, Default, Args)]
pub struct ServeCommand {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log every request and storage operation
    #[arg(short, long)]
    pub debug: bool,

    /// Largest accepted report body in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_content_length: Option<u64>,

    /// Database path or sqlite:// URI
    #[arg(long, value_name = "PATH")]
    pub database: Option<String>,
}

impl ServeCommand {
    /// Apply the command-line overrides to `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.debug {
            config.server.debug = true;
        }
        if let Some(limit) = self.max_content_length {
            config.server.max_content_length = limit;
        }
        if let Some(database) = &self.database {
            config.storage.database_path = Some(database.clone());
        }
    }
}

/// Clean-up command arguments.
#[derive(Debug, Args)]
pub struct CleanUpCommand {
    /// Output the summary as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_overrides() {
        let mut config = Config::default();
        ServeCommand {
            host: Some("0.0.0.0".to_string()),
            port: Some(8080),
            debug: true,
            max_content_length: Some(100),
            database: Some("sqlite:///run_tests.db".to_string()),
        }
        .apply(&mut config);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.debug);
        assert_eq!(config.server.max_content_length, 100);
        assert_eq!(config.database_path(), PathBuf::from("run_tests.db"));
    }

    #[test]
    fn test_serve_without_flags_keeps_config() {
        let mut config = Config::default();
        config.server.debug = true;
        ServeCommand::default().apply(&mut config);

        let mut expected = Config::default();
        expected.server.debug = true;
        assert_eq!(config, expected);
    }
}
