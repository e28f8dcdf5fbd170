//! Shared test doubles for dbwait integration tests
#![allow(dead_code)]

use dbwait::{ConnectError, ConnectionAttempt, Connector, ProgressReporter};
use std::cell::RefCell;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Connector that fails a fixed number of times before succeeding
pub struct ScriptedConnector {
    failures_before_success: Option<u32>,
    seen: RefCell<Vec<ConnectionAttempt>>,
}

impl ScriptedConnector {
    /// Fails attempts `1..=failures`, succeeds afterwards
    pub fn failing_first(failures: u32) -> Self {
        Self {
            failures_before_success: Some(failures),
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Never succeeds
    pub fn always_failing() -> Self {
        Self {
            failures_before_success: None,
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Number of connect calls made
    pub fn calls(&self) -> u32 {
        u32::try_from(self.seen.borrow().len()).unwrap()
    }

    /// Attempts in the order they were made
    pub fn attempts(&self) -> Vec<ConnectionAttempt> {
        self.seen.borrow().clone()
    }
}

impl Connector for ScriptedConnector {
    async fn connect(&self, attempt: &ConnectionAttempt) -> Result<(), ConnectError> {
        self.seen.borrow_mut().push(attempt.clone());
        let call = self.calls();
        match self.failures_before_success {
            Some(failures) if call > failures => Ok(()),
            _ => Err(ConnectError::Other {
                message: format!("scripted failure #{call}"),
            }),
        }
    }
}

/// Progress events in the order they were reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Waiting(String),
    Retrying { attempt: u32, max_attempts: u32 },
    Ready,
    Exhausted,
}

/// Reporter that keeps every event
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<Event>,
}

impl RecordingReporter {
    pub fn retry_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Retrying { .. }))
            .count()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

impl ProgressReporter for RecordingReporter {
    fn waiting(&mut self, target: &str) {
        self.events.push(Event::Waiting(target.to_string()));
    }

    fn retrying(&mut self, attempt: u32, max_attempts: u32) {
        self.events.push(Event::Retrying {
            attempt,
            max_attempts,
        });
    }

    fn ready(&mut self) {
        self.events.push(Event::Ready);
    }

    fn exhausted(&mut self) {
        self.events.push(Event::Exhausted);
    }
}

/// How the fake PostgreSQL server answers a startup message
#[derive(Debug, Clone, Copy)]
pub enum ScriptedServer {
    /// AuthenticationOk followed by ReadyForQuery
    Accept,
    /// FATAL ErrorResponse with SQLSTATE 28P01
    Reject,
    /// Reads the startup message and never answers
    Silent,
}

const SSL_REQUEST_CODE: i32 = 80_877_103;

impl ScriptedServer {
    /// Serve a single connection, consuming the listener
    pub async fn serve_one(self, listener: TcpListener) -> Vec<u8> {
        self.serve_next(&listener).await
    }

    /// Accept the next connection and answer it
    ///
    /// Returns the bytes the client sent after its startup message, read
    /// until the client closed the socket.
    pub async fn serve_next(self, listener: &TcpListener) -> Vec<u8> {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_startup(&mut socket).await.unwrap();

        match self {
            Self::Accept => {
                // AuthenticationOk
                socket.write_all(&[b'R', 0, 0, 0, 8, 0, 0, 0, 0]).await.unwrap();
                // ReadyForQuery, idle
                socket.write_all(&[b'Z', 0, 0, 0, 5, b'I']).await.unwrap();
            }
            Self::Reject => {
                socket.write_all(&error_response()).await.unwrap();
            }
            Self::Silent => {}
        }

        let mut trailer = Vec::new();
        let _ = socket.read_to_end(&mut trailer).await;
        trailer
    }
}

async fn read_startup(socket: &mut TcpStream) -> std::io::Result<()> {
    loop {
        let len = socket.read_i32().await?;
        let mut body = vec![0; usize::try_from(len - 4).unwrap()];
        socket.read_exact(&mut body).await?;

        if body[..4] == SSL_REQUEST_CODE.to_be_bytes() {
            socket.write_all(b"N").await?;
            continue;
        }
        return Ok(());
    }
}

fn error_response() -> Vec<u8> {
    let mut body = Vec::new();
    for (field, value) in [
        (b'S', "FATAL"),
        (b'V', "FATAL"),
        (b'C', "28P01"),
        (b'M', "password authentication failed for user \"openspp\""),
    ] {
        body.push(field);
        body.extend_from_slice(value.as_bytes());
        body.push(0);
    }
    body.push(0);

    let mut message = vec![b'E'];
    message.extend_from_slice(&i32::try_from(body.len() + 4).unwrap().to_be_bytes());
    message.extend(body);
    message
}
