use crate::config::WaitConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line interface for `dbwait`
///
/// Flags override the environment (`DB_HOST`, `DB_PORT`, ...), which in
/// turn overrides the optional config file.
#[derive(Parser, Debug)]
#[command(name = "dbwait")]
#[command(version = crate::VERSION)]
#[command(about = "dbwait - Block until PostgreSQL accepts connections")]
#[command(
    long_about = "Polls a PostgreSQL server until a connection succeeds. Exits 0 once it is \
                  reachable, 1 if it never became reachable within the attempt budget. \
                  Invalid settings (such as a non-numeric DB_PORT) fail immediately \
                  with exit code 1 instead of being retried."
)]
pub struct Cli {
    /// TOML file with [database] and [wait] tables
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database host [env: DB_HOST, default: db]
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Database port [env: DB_PORT, default: 5432]
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database user [env: DB_USER, default: openspp]
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// Database name [env: DB_NAME, default: postgres]
    #[arg(long, value_name = "NAME")]
    pub dbname: Option<String>,

    /// Maximum connection attempts [env: DB_WAIT_MAX_ATTEMPTS, default: 60]
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Seconds to sleep after a failed attempt [env: DB_WAIT_RETRY_DELAY, default: 2]
    #[arg(long, value_name = "SECS")]
    pub retry_delay: Option<u64>,

    /// Seconds allowed per attempt [env: DB_WAIT_CONNECT_TIMEOUT, default: 5]
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Apply explicitly passed flags on top of `config`
    pub fn apply_overrides(&self, config: &mut WaitConfig) {
        if let Some(host) = &self.host {
            config.database.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.database.port = port;
        }
        if let Some(user) = &self.user {
            config.database.user.clone_from(user);
        }
        if let Some(dbname) = &self.dbname {
            config.database.dbname.clone_from(dbname);
        }
        if let Some(max_attempts) = self.max_attempts {
            config.wait.max_attempts = max_attempts;
        }
        if let Some(secs) = self.retry_delay {
            config.wait.retry_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = self.connect_timeout {
            config.wait.connect_timeout = Duration::from_secs(secs);
        }
    }
}
