//! Bounded, fixed-delay readiness loop
//!
//! The waiter makes at most `max_attempts` connection attempts. Each
//! failed attempt is followed by a `retry_delay` pause, whatever the
//! failure cause was. The delay does not grow between attempts.

use crate::config::WaitConfig;
use crate::connection::{ConnectionAttempt, Connector, PostgresConnector};
use std::process::ExitCode;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Terminal state of a wait run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A connection succeeded
    Ready {
        /// Attempt number that succeeded (1-based)
        attempts: u32,
    },

    /// Every allowed attempt failed
    Exhausted {
        /// Number of attempts made
        attempts: u32,
    },
}

impl WaitOutcome {
    /// Whether the dependency became reachable
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Number of connection attempts performed
    #[must_use]
    pub const fn attempts(self) -> u32 {
        match self {
            Self::Ready { attempts } | Self::Exhausted { attempts } => attempts,
        }
    }

    /// Process exit status: 0 when ready, 1 otherwise
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        if self.is_ready() {
            0
        } else {
            1
        }
    }
}

impl From<WaitOutcome> for ExitCode {
    fn from(outcome: WaitOutcome) -> Self {
        Self::from(outcome.exit_code())
    }
}

/// Receives operator-facing progress events
pub trait ProgressReporter {
    /// The loop is about to start probing `target`
    fn waiting(&mut self, target: &str);
    /// Attempt `attempt` of `max_attempts` failed and the waiter will sleep
    fn retrying(&mut self, attempt: u32, max_attempts: u32);
    /// A connection succeeded
    fn ready(&mut self);
    /// All attempts failed
    fn exhausted(&mut self);
}

/// Writes progress to stdout and the final failure to stderr
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    service: String,
}

impl ConsoleReporter {
    /// Reporter that names the awaited service `service` in its messages
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new("PostgreSQL")
    }
}

// Allow println for operator-facing progress lines
#[allow(clippy::disallowed_methods)]
impl ProgressReporter for ConsoleReporter {
    fn waiting(&mut self, target: &str) {
        println!("Waiting for {} at {target}...", self.service);
    }

    fn retrying(&mut self, attempt: u32, max_attempts: u32) {
        println!(
            "{} is unavailable (attempt {attempt}/{max_attempts}) - sleeping",
            self.service
        );
    }

    fn ready(&mut self) {
        println!("{} is ready!", self.service);
    }

    fn exhausted(&mut self) {
        eprintln!("{} did not become ready in time", self.service);
    }
}

/// Polls a dependency until it accepts a connection or attempts run out
#[derive(Debug)]
pub struct ReadinessWaiter<C, R = ConsoleReporter> {
    config: WaitConfig,
    connector: C,
    reporter: R,
}

impl<C: Connector> ReadinessWaiter<C> {
    /// Waiter that reports to the console
    #[must_use]
    pub fn new(config: WaitConfig, connector: C) -> Self {
        Self::with_reporter(config, connector, ConsoleReporter::default())
    }
}

impl<C: Connector, R: ProgressReporter> ReadinessWaiter<C, R> {
    /// Waiter with a custom progress sink
    #[must_use]
    pub const fn with_reporter(config: WaitConfig, connector: C, reporter: R) -> Self {
        Self {
            config,
            connector,
            reporter,
        }
    }

    /// Configuration this waiter runs with
    #[must_use]
    pub const fn config(&self) -> &WaitConfig {
        &self.config
    }

    /// Progress sink
    #[must_use]
    pub const fn reporter(&self) -> &R {
        &self.reporter
    }

    /// The connector, e.g. to inspect a scripted one in tests
    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Run the loop to a terminal state
    #[allow(clippy::future_not_send)]
    pub async fn wait(&mut self) -> WaitOutcome {
        let settings = self.config.wait;
        let target = self.config.database.target();
        let start = Instant::now();

        self.reporter.waiting(&target);
        info!(
            "Waiting for {} (max_attempts={}, retry_delay={:?}, connect_timeout={:?})",
            target, settings.max_attempts, settings.retry_delay, settings.connect_timeout
        );

        let mut attempt = 0;
        while attempt < settings.max_attempts {
            let probe =
                ConnectionAttempt::new(&self.config.database, settings.connect_timeout, attempt + 1);
            debug!("Connecting to {} (attempt {})", target, probe.index);

            match self.connector.connect(&probe).await {
                Ok(()) => {
                    info!(
                        "{} reachable on attempt {} after {:?}",
                        target,
                        probe.index,
                        start.elapsed()
                    );
                    self.reporter.ready();
                    return WaitOutcome::Ready {
                        attempts: probe.index,
                    };
                }
                Err(e) => {
                    attempt += 1;
                    debug!(
                        "Attempt {}/{} against {} failed: {}",
                        attempt, settings.max_attempts, target, e
                    );
                    self.reporter.retrying(attempt, settings.max_attempts);
                    sleep(settings.retry_delay).await;
                }
            }
        }

        warn!(
            "{} still unreachable after {} attempts ({:?})",
            target,
            attempt,
            start.elapsed()
        );
        self.reporter.exhausted();
        WaitOutcome::Exhausted { attempts: attempt }
    }
}

/// Wait for the PostgreSQL server described by `config`, reporting to the console
#[allow(clippy::future_not_send)]
pub async fn wait_for_ready(config: WaitConfig) -> WaitOutcome {
    ReadinessWaiter::new(config, PostgresConnector::new())
        .wait()
        .await
}
