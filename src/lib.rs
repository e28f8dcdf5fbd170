//! `dbwait` - Wait for a database to accept connections
//!
//! Gates startup of a service until its PostgreSQL dependency is reachable,
//! using a bounded retry loop with a fixed delay between attempts.

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/// Command line interface
pub mod cli;
/// Configuration defaults and layering
pub mod config;
pub mod connection;
/// Error types
pub mod error;
pub mod waiter;

pub use config::WaitConfig;
pub use connection::{ConnectionAttempt, Connector, PostgresConnector};
pub use error::{ConfigError, ConnectError};
pub use waiter::{wait_for_ready, ConsoleReporter, ProgressReporter, ReadinessWaiter, WaitOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
