#![forbid(unsafe_code)]

//! pagekit public facade crate.
//!
//! Re-exports the types a page author needs from the internal crates and
//! offers a prelude plus a single error type for host applications.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use pagekit_core::{
    Clock, ConfigError, FieldId, FieldSnapshot, FormDocument, FormId, FormMessages, ManualClock,
    MemoryDocument, MonotonicClock, NotificationConfig, NotificationId, PageConfig, PageEvent,
    PipelineConfig, RateLimitConfig, SharedClock, sanitize,
};

// --- Runtime re-exports ----------------------------------------------------

pub use pagekit_runtime::{
    Cmd, ExitReason, Model, PageSimulator, Program, ProgramConfig, RuntimeError, ScriptedEvents,
    TaskPolicy,
};

// --- Widget re-exports -----------------------------------------------------

pub use pagekit_widgets::{FieldErrorDisplay, NotificationCenter, Severity};

// --- Form re-exports -------------------------------------------------------

pub use pagekit_forms::{
    FieldValidator, FormPage, FormPayload, FormPipeline, PageMsg, SendError, SimulatedTransport,
    Transport, ValidationResult, contact,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for pagekit hosts.
#[derive(Debug)]
pub enum Error {
    /// An environment override could not be parsed.
    Config(ConfigError),
    /// A submission could not be delivered.
    Send(SendError),
    /// The runtime stopped abnormally.
    Runtime(RuntimeError),
    /// I/O failure while writing output.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Send(err) => write!(f, "send error: {err}"),
            Self::Runtime(err) => write!(f, "runtime error: {err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Send(err) => Some(err),
            Self::Runtime(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<SendError> for Error {
    fn from(err: SendError) -> Self {
        Self::Send(err)
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        Self::Runtime(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Standard result type for pagekit hosts.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Cmd, Error, FormDocument, FormPage, FormPipeline, Model, NotificationCenter, PageConfig,
        PageEvent, Program, Result, Severity,
    };

    pub use crate::{core, forms, runtime, widgets};
}

pub use pagekit_core as core;
pub use pagekit_forms as forms;
pub use pagekit_runtime as runtime;
pub use pagekit_widgets as widgets;
