//! `aeneas` - crash and diagnostic report intake server
//!
//! This binary runs the HTTP service and its offline maintenance commands.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use aeneas::cli::{Cli, Command, ConfigCommand};
use aeneas::{init_logging, server, Config, ReportService, SqliteReportRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    if let Command::Serve(serve) = &cli.command {
        serve.apply(&mut config);
        config.validate()?;
    }

    init_logging(cli.verbosity().with_debug(config.server.debug));

    match cli.command {
        Command::Serve(_) => server::serve(&config).await?,
        Command::CleanUp(cmd) => handle_clean_up(&config, cmd.json).await?,
        Command::Status(cmd) => handle_status(&config, cmd.json).await?,
        Command::Config(cmd) => handle_config(&config, cmd)?,
    }
    Ok(())
}

fn open_repository(config: &Config) -> anyhow::Result<SqliteReportRepository> {
    let path = config.database_path();
    SqliteReportRepository::open(&path)
        .with_context(|| format!("opening database {}", path.display()))
}

async fn handle_clean_up(config: &Config, json: bool) -> anyhow::Result<()> {
    let repository = open_repository(config)?;
    let service = ReportService::new(Arc::new(repository), config.server.max_content_length);
    let summary = service.clean_up_all().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Examined: {}", summary.examined);
        println!("Repaired: {}", summary.repaired);
        println!("Skipped:  {}", summary.skipped);
    }
    Ok(())
}

async fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let repository = open_repository(config)?;
    let stats = repository.stats().await?;

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        let format_time = |time: Option<chrono::DateTime<chrono::Utc>>| {
            time.map_or_else(|| "-".to_string(), |t| t.to_rfc3339())
        };
        println!("aeneas status");
        println!("-------------");
        println!("Database:      {}", config.database_path().display());
        println!("Reports:       {}", stats.total_reports);
        println!("Oldest:        {}", format_time(stats.oldest_report));
        println!("Newest:        {}", format_time(stats.newest_report));
        println!("Size (bytes):  {}", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Host:               {}", config.server.host);
                println!("  Port:               {}", config.server.port);
                println!("  Debug:              {}", config.server.debug);
                println!(
                    "  Max content length: {}",
                    config.server.max_content_length
                );
                println!(
                    "  Request timeout:    {}s",
                    config.server.request_timeout_secs
                );
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
