//! Single connection attempts against the dependency being waited on

use crate::config::DatabaseConfig;
use crate::error::ConnectError;
use std::fmt;
use std::time::Duration;
use tokio_postgres::NoTls;
use tracing::debug;

/// Everything needed for one connection attempt
///
/// Built fresh for every loop iteration and dropped right after.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionAttempt {
    /// Target host
    pub host: String,
    /// Target port
    pub port: u16,
    /// User to authenticate as
    pub user: String,
    /// Password for `user`
    pub password: String,
    /// Database name
    pub dbname: String,
    /// Time allowed for this attempt
    pub timeout: Duration,
    /// 1-based attempt number
    pub index: u32,
}

impl ConnectionAttempt {
    /// Describe attempt `index` against `database`
    #[must_use]
    pub fn new(database: &DatabaseConfig, timeout: Duration, index: u32) -> Self {
        Self {
            host: database.host.clone(),
            port: database.port,
            user: database.user.clone(),
            password: database.password.clone(),
            dbname: database.dbname.clone(),
            timeout,
            index,
        }
    }
}

impl fmt::Debug for ConnectionAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionAttempt")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("dbname", &self.dbname)
            .field("timeout", &self.timeout)
            .field("index", &self.index)
            .finish()
    }
}

/// Opens and immediately releases a connection
///
/// Implementations must not hold on to the connection once `connect`
/// returns, on either the success or the failure path. Swapping the
/// implementation lets the same wait loop probe other kinds of services.
#[allow(async_fn_in_trait)]
pub trait Connector {
    /// Try to connect once, returning `Ok(())` only if the connection opened
    async fn connect(&self, attempt: &ConnectionAttempt) -> Result<(), ConnectError>;
}

/// [`Connector`] for PostgreSQL servers, backed by `tokio-postgres`
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresConnector;

impl PostgresConnector {
    /// Create a new connector
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn driver_config(attempt: &ConnectionAttempt) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&attempt.host)
            .port(attempt.port)
            .user(&attempt.user)
            .password(&attempt.password)
            .dbname(&attempt.dbname)
            .connect_timeout(attempt.timeout)
            .application_name("dbwait");
        config
    }
}

impl Connector for PostgresConnector {
    async fn connect(&self, attempt: &ConnectionAttempt) -> Result<(), ConnectError> {
        let config = Self::driver_config(attempt);

        // connect_timeout only covers the socket; bound the handshake too.
        let (client, connection) = tokio::time::timeout(attempt.timeout, config.connect(NoTls))
            .await
            .map_err(|_| ConnectError::Timeout(attempt.timeout))??;

        // The connection future finishes once every client is gone,
        // sending Terminate to the server on the way out.
        drop(client);
        match tokio::time::timeout(attempt.timeout, connection).await {
            Ok(Ok(())) => debug!("Connection to {}:{} closed", attempt.host, attempt.port),
            Ok(Err(e)) => debug!("Error while closing connection: {}", e),
            Err(_) => debug!("Connection close timed out, dropping socket"),
        }

        Ok(())
    }
}
