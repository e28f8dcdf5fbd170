//! Waiter configuration
//!
//! Values are layered in this order, later layers winning:
//! built-in defaults, an optional TOML file, the process environment,
//! and finally command-line flags (applied by the binary).

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the database host
pub const ENV_HOST: &str = "DB_HOST";
/// Environment variable holding the database port
pub const ENV_PORT: &str = "DB_PORT";
/// Environment variable holding the database user
pub const ENV_USER: &str = "DB_USER";
/// Environment variable holding the database password
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
/// Environment variable holding the database name
pub const ENV_DBNAME: &str = "DB_NAME";
/// Environment variable holding the maximum number of attempts
pub const ENV_MAX_ATTEMPTS: &str = "DB_WAIT_MAX_ATTEMPTS";
/// Environment variable holding the delay between attempts, in seconds
pub const ENV_RETRY_DELAY: &str = "DB_WAIT_RETRY_DELAY";
/// Environment variable holding the per-attempt timeout, in seconds
pub const ENV_CONNECT_TIMEOUT: &str = "DB_WAIT_CONNECT_TIMEOUT";

/// Complete configuration for one wait run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WaitConfig {
    /// Where to connect and as whom
    pub database: DatabaseConfig,
    /// How long to keep trying
    pub wait: WaitSettings,
}

/// Database connection target
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Database to connect to
    pub dbname: String,
}

/// Retry loop parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    /// Upper bound on connection attempts
    pub max_attempts: u32,
    /// Fixed pause after each failed attempt
    pub retry_delay: Duration,
    /// Time allowed for a single attempt
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "db".to_string(),
            port: 5432,
            user: "openspp".to_string(),
            password: "openspp".to_string(),
            dbname: "postgres".to_string(),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("dbname", &self.dbname)
            .finish()
    }
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            retry_delay: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseConfig {
    /// `host:port` string used in operator-facing messages
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// On-disk TOML layout; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    database: FileDatabase,
    wait: FileWait,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileDatabase {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    dbname: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileWait {
    max_attempts: Option<u32>,
    retry_delay_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
}

impl WaitConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_process_env()?;
        Ok(config)
    }

    /// Overlay the process environment onto an already loaded config
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|var| std::env::var(var).ok())
    }

    /// Load a TOML file on top of the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse TOML text on top of the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(contents)?;
        let mut config = Self::default();

        let db = &mut config.database;
        if let Some(host) = file.database.host {
            db.host = host;
        }
        if let Some(port) = file.database.port {
            db.port = port;
        }
        if let Some(user) = file.database.user {
            db.user = user;
        }
        if let Some(password) = file.database.password {
            db.password = password;
        }
        if let Some(dbname) = file.database.dbname {
            db.dbname = dbname;
        }

        let wait = &mut config.wait;
        if let Some(max_attempts) = file.wait.max_attempts {
            wait.max_attempts = max_attempts;
        }
        if let Some(secs) = file.wait.retry_delay_secs {
            wait.retry_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = file.wait.connect_timeout_secs {
            wait.connect_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Overlay values found through `lookup`
    ///
    /// `lookup` maps a variable name to its value. Empty values are treated
    /// as unset so `DB_HOST=` in a compose file does not blank the host.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.is_empty());

        if let Some(host) = get(ENV_HOST) {
            self.database.host = host;
        }
        if let Some(port) = get(ENV_PORT) {
            self.database.port = parse_env(ENV_PORT, &port)?;
        }
        if let Some(user) = get(ENV_USER) {
            self.database.user = user;
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.database.password = password;
        }
        if let Some(dbname) = get(ENV_DBNAME) {
            self.database.dbname = dbname;
        }
        if let Some(value) = get(ENV_MAX_ATTEMPTS) {
            self.wait.max_attempts = parse_env(ENV_MAX_ATTEMPTS, &value)?;
        }
        if let Some(value) = get(ENV_RETRY_DELAY) {
            self.wait.retry_delay = Duration::from_secs(parse_env(ENV_RETRY_DELAY, &value)?);
        }
        if let Some(value) = get(ENV_CONNECT_TIMEOUT) {
            self.wait.connect_timeout =
                Duration::from_secs(parse_env(ENV_CONNECT_TIMEOUT, &value)?);
        }

        Ok(())
    }

    /// Reject settings the waiter cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.database.host.is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "host",
                reason: "must not be empty".to_string(),
            });
        }
        if self.wait.max_attempts == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.wait.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidSetting {
                name: "connect_timeout",
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env<T>(var: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnv {
            var: var.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}
