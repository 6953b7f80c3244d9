#![forbid(unsafe_code)]

//! Core validation types and built-in validators.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Error Codes
// ---------------------------------------------------------------------------

/// A required field was left blank.
pub const ERROR_CODE_REQUIRED: &str = "required";
/// A value did not match its field's pattern.
pub const ERROR_CODE_PATTERN: &str = "pattern";
/// A required checkbox was not checked.
pub const ERROR_CODE_ACCEPTANCE: &str = "acceptance";

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Person names: letters (including Latin-1 accented), space, apostrophe and
/// hyphen, 2 to 50 characters.
pub const NAME_PATTERN: &str = r"^[a-zA-ZÀ-ÿ\s'-]{2,50}$";
/// Local part, `@`, and a domain containing a dot; no whitespace anywhere.
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
/// Digits, space, `+`, `-` and parentheses, 10 to 20 characters.
pub const PHONE_PATTERN: &str = r"^[0-9 +()-]{10,20}$";
/// At least 10 characters of any content, line breaks included.
pub const MESSAGE_PATTERN: &str = r"(?s)^.{10,}$";

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NAME_PATTERN).expect("name pattern compiles"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("phone pattern compiles"));
static MESSAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MESSAGE_PATTERN).expect("message pattern compiles"));

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A validation failure: stable code plus the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Stable error code for programmatic handling.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// The result of a validation operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    #[default]
    Valid,
    Invalid(ValidationError),
}

impl ValidationResult {
    /// Shorthand for an invalid result.
    #[must_use]
    pub fn invalid(code: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid(ValidationError::new(code, message))
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Returns the error if the result is `Invalid`, otherwise `None`.
    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e),
        }
    }

    /// Returns the error message if the result is `Invalid`, otherwise `None`.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error().map(|e| e.message.as_str())
    }

    /// Combine two results, keeping the first error.
    #[must_use]
    pub fn and(self, other: impl FnOnce() -> Self) -> Self {
        match self {
            Self::Valid => other(),
            Self::Invalid(_) => self,
        }
    }
}

// ---------------------------------------------------------------------------
// Validator Trait
// ---------------------------------------------------------------------------

/// A check over values of type `T`.
///
/// # Implementing a Custom Validator
///
/// ```rust
/// use pagekit_forms::validation::{ValidationError, ValidationResult, Validator};
///
/// struct NoDigits;
///
/// impl Validator<str> for NoDigits {
///     fn validate(&self, value: &str) -> ValidationResult {
///         if value.chars().any(|c| c.is_ascii_digit()) {
///             ValidationResult::Invalid(ValidationError::new("no_digits", self.error_message()))
///         } else {
///             ValidationResult::Valid
///         }
///     }
///
///     fn error_message(&self) -> &str {
///         "Digits are not allowed"
///     }
/// }
///
/// assert!(NoDigits.validate("Anna").is_valid());
/// assert!(NoDigits.validate("R2D2").is_invalid());
/// ```
pub trait Validator<T: ?Sized>: Send + Sync {
    /// Validate the given value.
    fn validate(&self, value: &T) -> ValidationResult;

    /// The message reported on failure.
    fn error_message(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Built-in Validators
// ---------------------------------------------------------------------------

/// Rejects blank values. Whitespace-only counts as blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Required {
    message: String,
}

impl Required {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Validator<str> for Required {
    fn validate(&self, value: &str) -> ValidationResult {
        if value.trim().is_empty() {
            ValidationResult::invalid(ERROR_CODE_REQUIRED, &self.message)
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        &self.message
    }
}

/// Requires the whole value to match a regular expression.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    message: String,
}

impl Pattern {
    /// Compile a custom pattern.
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            message: message.into(),
        })
    }

    /// Person-name rule.
    #[must_use]
    pub fn name(message: impl Into<String>) -> Self {
        Self::from_static(&NAME_RE, message)
    }

    /// Email address rule.
    #[must_use]
    pub fn email(message: impl Into<String>) -> Self {
        Self::from_static(&EMAIL_RE, message)
    }

    /// Phone number rule.
    #[must_use]
    pub fn phone(message: impl Into<String>) -> Self {
        Self::from_static(&PHONE_RE, message)
    }

    /// Free-text message rule.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::from_static(&MESSAGE_RE, message)
    }

    fn from_static(regex: &LazyLock<Regex>, message: impl Into<String>) -> Self {
        Self {
            regex: Regex::clone(regex),
            message: message.into(),
        }
    }

    /// The underlying expression.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether `value` matches, without building a result.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl Validator<str> for Pattern {
    fn validate(&self, value: &str) -> ValidationResult {
        if self.regex.is_match(value) {
            ValidationResult::Valid
        } else {
            ValidationResult::invalid(ERROR_CODE_PATTERN, &self.message)
        }
    }

    fn error_message(&self) -> &str {
        &self.message
    }
}

/// Requires a checkbox to be checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acceptance {
    message: String,
}

impl Acceptance {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Validator<bool> for Acceptance {
    fn validate(&self, checked: &bool) -> ValidationResult {
        if *checked {
            ValidationResult::Valid
        } else {
            ValidationResult::invalid(ERROR_CODE_ACCEPTANCE, &self.message)
        }
    }

    fn error_message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank() {
        let required = Required::new("needed");
        assert!(required.validate("x").is_valid());
        let result = required.validate("   ");
        assert_eq!(result.error().map(|e| e.code), Some(ERROR_CODE_REQUIRED));
        assert_eq!(result.error_message(), Some("needed"));
    }

    #[test]
    fn name_pattern() {
        let name = Pattern::name("bad name");
        assert!(name.matches("Anna-Maria O'Brien"));
        assert!(name.matches("Zoë Ñúñez"));
        assert!(!name.matches("A"));
        assert!(!name.matches("R2D2"));
        assert!(!name.matches(&"a".repeat(51)));
        assert!(name.matches(&"é".repeat(50)));
    }

    #[test]
    fn email_pattern() {
        let email = Pattern::email("bad email");
        assert!(email.matches("a@b.co"));
        assert!(!email.matches("a b@c.d"));
        assert!(!email.matches("noatsign.com"));
        assert!(!email.matches("a@nodot"));
    }

    #[test]
    fn phone_pattern() {
        let phone = Pattern::phone("bad phone");
        assert!(phone.matches("+49 (0)30 1234567"));
        assert!(!phone.matches("12345"));
        assert!(!phone.matches("0301234567x"));
        assert!(!phone.matches(&"1".repeat(21)));
        assert!(!phone.matches("030\t1234567"));
        assert!(!phone.matches("030\n1234567"));
    }

    #[test]
    fn message_pattern_counts_characters() {
        let message = Pattern::message("too short");
        assert!(message.matches("0123456789"));
        assert!(!message.matches("012345678"));
        assert!(message.matches("line one\nline two"));
        assert!(message.matches("ääääääääää"));
    }

    #[test]
    fn custom_pattern_reports_compile_errors() {
        assert!(Pattern::new("(", "x").is_err());
        let zip = Pattern::new(r"^\d{5}$", "five digits").expect("valid pattern");
        assert_eq!(zip.validate("1234").error_message(), Some("five digits"));
        assert_eq!(zip.as_str(), r"^\d{5}$");
    }

    #[test]
    fn acceptance_requires_checked() {
        let accept = Acceptance::new("accept it");
        assert!(accept.validate(&true).is_valid());
        assert_eq!(
            accept.validate(&false),
            ValidationResult::invalid(ERROR_CODE_ACCEPTANCE, "accept it")
        );
    }

    #[test]
    fn and_keeps_first_error() {
        let first = ValidationResult::invalid("a", "first");
        let combined = first.and(|| ValidationResult::invalid("b", "second"));
        assert_eq!(combined.error_message(), Some("first"));
        assert!(ValidationResult::Valid.and(|| ValidationResult::Valid).is_valid());
    }
}
