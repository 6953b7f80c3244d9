#![forbid(unsafe_code)]

//! Form validation and submission for pagekit pages.
//!
//! # Role in pagekit
//! - [`validation`] holds the validators and the field-to-rule bindings.
//! - [`FieldValidator`] applies the validation order to one field.
//! - [`FormPipeline`] reacts to blur, input and submit for one form and
//!   drives the send through a [`Transport`].
//! - [`FormPage`] hosts pipelines and the notification stack as a runtime
//!   [`Model`](pagekit_runtime::Model).
//!
//! # Feature Flags
//!
//! | Feature | Effect |
//! |---------|--------|
//! | `json` | [`FormPayload`] serializes to a JSON object |

pub mod field;
pub mod page;
pub mod payload;
pub mod pipeline;
pub mod submission;
pub mod transport;
pub mod validation;
pub mod validator;

pub use field::FieldSpec;
pub use page::{FormPage, PageMsg};
pub use payload::FormPayload;
pub use pipeline::{FormMsg, FormPipeline, SubmitEvent, SubmitOutcome};
pub use submission::{InFlight, SubmissionEvent, SubmissionToken, SubmissionTracker};
pub use transport::{FnTransport, RecordingTransport, SendError, SimulatedTransport, Transport};
pub use validation::{
    Acceptance, Pattern, Required, RuleSet, ValidationError, ValidationResult, Validator, contact,
};
pub use validator::FieldValidator;
