#![forbid(unsafe_code)]

//! User-visible feedback components for pagekit pages.
//!
//! # Role in pagekit
//! - [`NotificationCenter`] owns the stack of transient alerts raised by
//!   forms and any other page collaborator.
//! - [`FieldErrorDisplay`] renders the inline message next to an invalid
//!   field.
//!
//! Both render to plain text (for terminals and logs) and to markup.

pub mod field_error;
pub mod notification;
pub mod text;

pub use field_error::FieldErrorDisplay;
pub use notification::{
    ExitCause, Notification, NotificationCenter, NotificationEvent, NotificationPhase, Severity,
};
