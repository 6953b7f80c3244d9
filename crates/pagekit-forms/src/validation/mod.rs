#![forbid(unsafe_code)]

//! Field validation rules.
//!
//! - A [`Validator`] trait checking one value.
//! - Built-in validators: [`Required`], regex-backed [`Pattern`] and the
//!   checkbox [`Acceptance`] check.
//! - A [`RuleSet`] binding field identities to pattern rules.
//!
//! Validation failures are values ([`ValidationResult::Invalid`]), never
//! errors returned through `Result`.
//!
//! # Example
//!
//! ```rust
//! use pagekit_forms::validation::{Pattern, Validator};
//!
//! let email = Pattern::email("Please enter a valid email address");
//! assert!(email.validate("a@b.co").is_valid());
//! assert!(email.validate("a b@c.d").is_invalid());
//! ```

pub mod rules;
mod validators;

pub use rules::{RuleSet, TextRule, contact};
pub use validators::{
    Acceptance, EMAIL_PATTERN, ERROR_CODE_ACCEPTANCE, ERROR_CODE_PATTERN, ERROR_CODE_REQUIRED,
    MESSAGE_PATTERN, NAME_PATTERN, PHONE_PATTERN, Pattern, Required, ValidationError,
    ValidationResult, Validator,
};
