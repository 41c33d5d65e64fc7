//! Connection parameters and tool settings

use serde::{Deserialize, Serialize};
use std::time::Duration;
use zdk_core::{Error as ZError, Result as ZResult, ZConfig};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_PASSWORD: &str = "";
pub const DEFAULT_DATABASE: &str = "openmanus";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything needed to open one MySQL connection
///
/// Built fresh for every tool call and dropped with it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Connection fields as a caller may send them, each one optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl ConnectionOverrides {
    /// Fill every omitted field from `defaults`
    pub fn resolve(self, defaults: &ConnectionConfig) -> ConnectionConfig {
        ConnectionConfig {
            host: self.host.unwrap_or_else(|| defaults.host.clone()),
            port: self.port.unwrap_or(defaults.port),
            user: self.user.unwrap_or_else(|| defaults.user.clone()),
            password: self.password.unwrap_or_else(|| defaults.password.clone()),
            database: self.database.unwrap_or_else(|| defaults.database.clone()),
        }
    }
}

/// Connection object whose five fields are all mandatory
///
/// `data_analysis` applies no defaults to its connection.
#[derive(Clone, Deserialize)]
pub struct RequiredConnection {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl From<RequiredConnection> for ConnectionConfig {
    fn from(conn: RequiredConnection) -> Self {
        Self {
            host: conn.host,
            port: conn.port,
            user: conn.user,
            password: conn.password,
            database: conn.database,
        }
    }
}

/// Settings shared by the tools of one factory call
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Values used for connection fields the caller leaves out
    pub defaults: ConnectionConfig,
    /// Bound on connecting and on each statement
    pub timeout: Duration,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            defaults: ConnectionConfig::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ToolSettings {
    /// Settings from the `[mysql]` section; unset fields keep the defaults
    ///
    /// A zero `timeout_secs` is rejected: it would fail every call.
    pub fn from_config(config: &ZConfig) -> ZResult<Self> {
        let section = &config.mysql;
        if section.timeout_secs == 0 {
            return Err(ZError::config_error(
                "mysql.timeout_secs must be at least 1",
            ));
        }

        let overrides = ConnectionOverrides {
            host: section.host.clone(),
            port: section.port,
            user: section.user.clone(),
            password: section.password.clone(),
            database: section.database.clone(),
        };

        Ok(Self {
            defaults: overrides.resolve(&ConnectionConfig::default()),
            timeout: Duration::from_secs(section.timeout_secs),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
