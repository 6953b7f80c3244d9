#![forbid(unsafe_code)]

//! Runtime for pagekit pages.
//!
//! # Role in pagekit
//! Pages are written as [`Model`]s. The runtime delivers host events to
//! them, reconciles their declared listeners, schedules delayed messages,
//! runs background tasks and honors navigation requests.
//!
//! - [`Program`] runs a model against the wall clock with tasks on threads.
//! - [`PageSimulator`] runs the same model deterministically for tests.

pub mod listener;
pub mod program;
pub mod simulator;

pub use listener::{ListenerDiff, ListenerSet};
pub use program::{
    Cmd, EventSource, ExitReason, Model, Program, ProgramConfig, ProgramOutcome, RuntimeError,
    ScriptedEvents, TaskSpec, panic_message,
};
pub use simulator::{CmdRecord, PageSimulator, TaskPolicy};
