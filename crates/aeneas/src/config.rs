//! Configuration management for aeneas.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::{Uncased, UncasedStr},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::admission::DEFAULT_MAX_CONTENT_LENGTH;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "aeneas";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "reports.db";

/// Prefix of all environment variables read by aeneas.
const ENV_PREFIX: &str = "AENEAS_";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 4935;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `AENEAS_`)
/// 2. TOML config file at `~/.config/aeneas/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to bind. 0 picks an ephemeral port. A value that is not a
    /// number at all falls back to [`DEFAULT_PORT`].
    #[serde(deserialize_with = "lenient_port")]
    pub port: u16,
    /// Verbose logging of every request and storage operation.
    #[serde(deserialize_with = "lenient_flag")]
    pub debug: bool,
    /// Largest accepted report body in bytes.
    pub max_content_length: u64,
    /// Seconds before an in-flight request is abandoned.
    pub request_timeout_secs: u64,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database location: a path, `:memory:`, or a `sqlite://` URI.
    /// Defaults to `~/.local/share/aeneas/reports.db`
    pub database_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            debug: false,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Accept `true`/`t`/`1`/`y` and `false`/`f`/`0`/`n` (any case) as well as
/// real booleans. Any other non-empty string is true.
fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
        Flag::Text(text) => !matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "false" | "f" | "0" | "n" | ""
        ),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

/// Out-of-range numbers are still an error.
fn lenient_port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => port,
        PortValue::Text(text) => text.trim().parse().unwrap_or(DEFAULT_PORT),
    })
}

impl ServerConfig {
    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Map an environment key (prefix stripped) to a configuration key.
///
/// Nested keys use `__` (`AENEAS_SERVER__PORT`); the flat legacy names
/// (`AENEAS_PORT`, `AENEAS_DEBUG`, `AENEAS_DB_URI`, ...) are also accepted.
fn env_key(key: &UncasedStr) -> Uncased<'_> {
    let key = key.as_str().to_ascii_lowercase();
    let mapped = match key.as_str() {
        "host" | "port" | "debug" | "max_content_length" | "request_timeout_secs" => {
            format!("server.{key}")
        }
        "db_uri" | "database_path" | "database_url" => "storage.database_path".to_string(),
        _ => key.replace("__", "."),
    };
    mapped.into()
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::figment(&config_file).extract::<Config>()?.validated()
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file).nested())
            .merge(Env::prefixed(ENV_PREFIX).map(env_key))
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.max_content_length == 0 {
            return Err(Error::ConfigValidation {
                message: "max_content_length must be greater than 0".to_string(),
            });
        }

        if self.server.request_timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "request_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.server.host.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "host must not be empty".to_string(),
            });
        }

        if matches!(self.storage.database_path.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(Error::ConfigValidation {
                message: "database_path must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults and stripping any
    /// `sqlite://` scheme.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        match self.storage.database_path.as_deref() {
            Some(location) => PathBuf::from(strip_sqlite_scheme(location)),
            None => Self::default_data_dir().join(DATABASE_FILE_NAME),
        }
    }
}

/// `sqlite:///rel/path` names `rel/path`, `sqlite:////abs/path` names `/abs/path`.
fn strip_sqlite_scheme(location: &str) -> &str {
    match location.strip_prefix("sqlite://") {
        Some("") => ":memory:",
        Some(rest) => rest.strip_prefix('/').unwrap_or(rest),
        None => location,
    }
}
