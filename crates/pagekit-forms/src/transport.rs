#![forbid(unsafe_code)]

//! The send operation behind a form submission.
//!
//! A [`Transport`] receives the sanitized payload and blocks until the send
//! settles. The pipeline runs it off the update path as a runtime task, so a
//! slow transport never stalls event handling.
//!
//! # Failure Modes
//!
//! | Failure | Reported as |
//! |---------|-------------|
//! | Endpoint refused the submission | `SendError::Rejected` |
//! | Connection or I/O problem | `SendError::Transport` |
//! | Transport panicked | `SendError::Panicked` (caught by the pipeline) |

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::payload::FormPayload;

/// Why a send failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The receiving end refused the submission.
    Rejected { status: u16, reason: String },
    /// The submission could not be delivered.
    Transport(String),
    /// The transport panicked; the payload is the panic message.
    Panicked(String),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { status, reason } => {
                write!(f, "submission rejected with status {status}: {reason}")
            }
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Panicked(msg) => write!(f, "transport panicked: {msg}"),
        }
    }
}

impl std::error::Error for SendError {}

/// Delivers a form payload.
pub trait Transport: Send + Sync {
    /// Send the payload, blocking until it settles.
    fn send(&self, payload: &FormPayload) -> Result<(), SendError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "transport"
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, payload: &FormPayload) -> Result<(), SendError> {
        (**self).send(payload)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Stand-in transport that waits a fixed latency and succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedTransport {
    latency: Duration,
}

impl SimulatedTransport {
    /// Latency of the reference contact page.
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1500);

    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    #[must_use]
    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LATENCY)
    }
}

impl Transport for SimulatedTransport {
    fn send(&self, payload: &FormPayload) -> Result<(), SendError> {
        tracing::debug!(fields = payload.len(), latency_ms = self.latency.as_millis() as u64, "simulating send");
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

/// Transport backed by a closure.
pub struct FnTransport<F> {
    name: String,
    f: F,
}

impl<F> FnTransport<F>
where
    F: Fn(&FormPayload) -> Result<(), SendError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransport")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> Transport for FnTransport<F>
where
    F: Fn(&FormPayload) -> Result<(), SendError> + Send + Sync,
{
    fn send(&self, payload: &FormPayload) -> Result<(), SendError> {
        (self.f)(payload)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<FormPayload>,
    outcomes: VecDeque<Result<(), SendError>>,
}

/// Transport that records every payload and replays scripted outcomes.
///
/// Clones share the same record. Once the script runs out every send
/// succeeds.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of a future send.
    #[must_use]
    pub fn then(self, outcome: Result<(), SendError>) -> Self {
        self.lock().outcomes.push_back(outcome);
        self
    }

    /// Number of sends so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Payloads in the order they were sent.
    #[must_use]
    pub fn calls(&self) -> Vec<FormPayload> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for RecordingTransport {
    fn send(&self, payload: &FormPayload) -> Result<(), SendError> {
        let mut recording = self.lock();
        recording.calls.push(payload.clone());
        recording.outcomes.pop_front().unwrap_or(Ok(()))
    }

    fn name(&self) -> &str {
        "recording"
    }
}
