#![forbid(unsafe_code)]

//! Core building blocks for pagekit.
//!
//! Everything in this crate is host-agnostic: no browser bindings and no
//! threads. The embedding page pushes events in, advances time explicitly
//! and reads rendered state back out.
//!
//! # Role in pagekit
//! `pagekit-core` is the leaf of the workspace. The runtime, widgets and
//! forms crates build on its identifiers, the [`dom::FormDocument`] contract,
//! the keyed [`timer::TimerQueue`] and the [`sanitize`] function.

pub mod clock;
pub mod config;
pub mod dom;
pub mod event;
pub mod id;
pub mod rate_limit;
pub mod sanitize;
pub mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock, SharedClock};
pub use config::{
    ConfigError, FormMessages, NotificationConfig, PageConfig, PipelineConfig, RateLimitConfig,
};
pub use dom::{
    ControlKind, DEFAULT_CHECKBOX_VALUE, ERROR_CLASS, FEEDBACK_CLASS, FieldSnapshot, FormDocument,
    MemoryDocument,
};
pub use event::{EventKind, Listen, PageEvent, Target};
pub use id::{FieldId, FormId, NotificationId};
pub use sanitize::{sanitize, sanitize_into};
pub use timer::TimerQueue;
