//! Layered configuration: defaults, YAML file, `PRINT_DIS_*` environment
//! variables, then command-line flags.

use std::env;
use std::path::{Path, PathBuf};

use printdis_migrations::{Dialect, MigrationResult};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::args::Cli;

pub const ENV_PREFIX: &str = "PRINT_DIS_";
pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db: DbConfig,
    pub log: LogConfig,
}

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    #[serde(rename = "type")]
    pub db_type: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// File path for SQLite, database name for PostgreSQL
    pub database: String,
    pub ssl_mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            db_type: "sqlite".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "print-dis.db".to_string(),
            ssl_mode: "disable".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Config {
    /// Build the effective configuration for one invocation
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match cli.config.as_deref() {
            Some(path) => Self::from_file(path)?,
            None => match find_config_file() {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env()?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    /// Override fields from `PRINT_DIS_*` variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(value) = lookup("DB_TYPE") {
            self.db.db_type = value;
        }
        if let Some(value) = lookup("DB_HOST") {
            self.db.host = value;
        }
        if let Some(value) = lookup("DB_PORT") {
            self.db.port = value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                field: "db.port".to_string(),
                value,
                expected: "valid port number (1-65535)".to_string(),
            })?;
        }
        if let Some(value) = lookup("DB_USER") {
            self.db.user = value;
        }
        if let Some(value) = lookup("DB_PASSWORD") {
            self.db.password = value;
        }
        if let Some(value) = lookup("DB_DATABASE") {
            self.db.database = value;
        }
        if let Some(value) = lookup("DB_SSL_MODE") {
            self.db.ssl_mode = value;
        }
        if let Some(value) = lookup("LOG_LEVEL") {
            self.log.level = value;
        }
        if let Some(value) = lookup("LOG_FORMAT") {
            self.log.format = value;
        }
        Ok(())
    }

    /// Command-line flags win over every other source
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(db_type) = &cli.db_type {
            self.db.db_type = db_type.clone();
        }
        if let Some(db_path) = &cli.db_path {
            self.db.database = db_path.clone();
        }
        if cli.verbose {
            self.log.level = "debug".to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.db.validate()?;
        self.log.validate()
    }
}

impl DbConfig {
    pub fn dialect(&self) -> MigrationResult<Dialect> {
        self.db_type.parse()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "db.database".to_string(),
                reason: "Database name cannot be empty".to_string(),
            });
        }

        if self.port == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "db.port".to_string(),
                reason: "Port cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    /// Connection URL for `printdis_migrations::connect`
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        let dialect = self.dialect().map_err(|_| ConfigError::InvalidValue {
            field: "db.type".to_string(),
            value: self.db_type.clone(),
            expected: "sqlite or postgres".to_string(),
        })?;

        match dialect {
            Dialect::Sqlite => Ok(format!("sqlite://{}?mode=rwc", self.database)),
            Dialect::Postgres => self.postgres_url(),
        }
    }

    fn postgres_url(&self) -> Result<String, ConfigError> {
        let invalid = |field: &str, value: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            expected: "a value usable in a postgres:// URL".to_string(),
        };

        let mut url = Url::parse("postgres://localhost")
            .map_err(|e| ConfigError::ParseError { message: e.to_string() })?;
        url.set_host(Some(&self.host))
            .map_err(|_| invalid("db.host", &self.host))?;
        url.set_port(Some(self.port))
            .map_err(|_| invalid("db.port", &self.port.to_string()))?;
        url.set_username(&self.user)
            .map_err(|_| invalid("db.user", &self.user))?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|_| invalid("db.password", "<redacted>"))?;
        }
        url.set_path(&self.database);
        url.query_pairs_mut().append_pair("sslmode", &self.ssl_mode);

        Ok(url.into())
    }
}

impl LogConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "log.level".to_string(),
                value: self.level.clone(),
                expected: "trace, debug, info, warn, or error".to_string(),
            });
        }

        let valid_formats = ["compact", "pretty", "json"];
        if !valid_formats.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "log.format".to_string(),
                value: self.format.clone(),
                expected: "compact, pretty, or json".to_string(),
            });
        }

        Ok(())
    }
}

/// First `config.yaml` in the working directory, `$HOME/.print-dis/` or
/// `/etc/print-dis/`
fn find_config_file() -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(home) = env::var_os("HOME") {
        candidates.push(PathBuf::from(home).join(".print-dis").join(CONFIG_FILE_NAME));
    }
    candidates.push(PathBuf::from("/etc/print-dis").join(CONFIG_FILE_NAME));

    candidates.into_iter().find(|path| path.is_file())
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue { field: String, value: String, expected: String },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },

    #[error("Configuration parsing error: {message}")]
    ParseError { message: String },
}
