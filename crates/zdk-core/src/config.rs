//! Configuration management for ZDK database tools
//!
//! Loads configuration with priority:
//! 1. config.toml (or specified config file)
//! 2. Environment variables referenced as `${VAR_NAME}`
//! 3. Defaults

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// ZDK configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZConfig {
    #[serde(default)]
    pub mysql: MySqlSection,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// `[mysql]` section
///
/// Connection fields left unset fall back to the tool defaults
/// (`localhost:3306`, user `root`, empty password, database `openmanus`).
#[derive(Clone, Serialize, Deserialize)]
pub struct MySqlSection {
    pub host: Option<String>,

    pub port: Option<u16>,

    pub user: Option<String>,

    /// Password (can reference env var with ${VAR_NAME})
    pub password: Option<String>,

    pub database: Option<String>,

    /// Upper bound for connecting and for each statement, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub service_name: Option<String>,

    #[serde(default)]
    pub log_format: LogFormat,
}

/// Output format of the log layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for MySqlSection {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for MySqlSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: None,
            log_format: LogFormat::default(),
        }
    }
}

impl ZConfig {
    /// Load configuration with the following priority:
    /// 1. config.toml in current directory or a parent
    /// 2. Environment variables (referenced from the file)
    /// 3. Defaults
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, falling back to defaults when no config.toml exists
    pub fn load_or_default() -> Result<Self> {
        match Self::find_config_file() {
            Ok(path) => Self::load_from(Some(&path)),
            Err(_) => {
                tracing::debug!("No config.toml found, using defaults");
                let mut config = Self::default();
                config.resolve_env_vars();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            Self::find_config_file()?
        };

        // A .env next to the working directory may provide referenced variables
        dotenvy::dotenv().ok();

        tracing::debug!("Loading configuration from: {:?}", config_path);

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        config.resolve_env_vars();

        Ok(config)
    }

    /// Parse configuration from TOML text without touching the environment
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Find config.toml by searching current directory and parents
    fn find_config_file() -> Result<PathBuf> {
        let mut current = env::current_dir()?;

        loop {
            let config_path = current.join("config.toml");
            if config_path.exists() {
                return Ok(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        Err(anyhow!(
            "config.toml not found. Create one with: cp config.toml.example config.toml"
        ))
    }

    /// Resolve ${VAR_NAME} references to environment variables
    fn resolve_env_vars(&mut self) {
        for field in [
            &mut self.mysql.host,
            &mut self.mysql.user,
            &mut self.mysql.password,
            &mut self.mysql.database,
            &mut self.observability.service_name,
        ] {
            if let Some(value) = field.take() {
                *field = Self::resolve_env_var(&value);
            }
        }

        // Unset password falls back to MYSQL_PASSWORD
        if self.mysql.password.is_none() {
            self.mysql.password = env::var("MYSQL_PASSWORD").ok();
        }
    }

    /// Resolve a single ${VAR_NAME} reference
    fn resolve_env_var(value: &str) -> Option<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let var_name = &value[2..value.len() - 1];
            env::var(var_name).ok()
        } else {
            Some(value.to_string())
        }
    }

    /// Create test-friendly defaults (no files, no environment)
    pub fn test_defaults() -> Self {
        Self {
            mysql: MySqlSection {
                host: Some("127.0.0.1".to_string()),
                port: Some(3306),
                user: Some("root".to_string()),
                password: Some(String::new()),
                database: Some("openmanus_test".to_string()),
                timeout_secs: 5,
            },
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
