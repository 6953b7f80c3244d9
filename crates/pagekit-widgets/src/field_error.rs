#![forbid(unsafe_code)]

//! Inline field error display.
//!
//! Renders the message shown next to an invalid field, either as text for a
//! terminal or as the `invalid-feedback` node markup a host page inserts.
//!
//! # Invariants
//!
//! 1. The icon is always rendered when the error is shown.
//! 2. Rendered width never exceeds the requested width.
//! 3. Markup output is escaped.
//!
//! # Failure Modes
//!
//! | Scenario | Behavior |
//! |----------|----------|
//! | Empty message | Renders icon only |
//! | Width smaller than the icon | Renders nothing |
//! | Very narrow width | Truncates the message with an ellipsis |

use pagekit_core::{FEEDBACK_CLASS, sanitize};

use crate::text::{display_width, truncate};

/// Default error icon.
pub const ERROR_ICON_DEFAULT: &str = "⚠";

/// Inline error for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrorDisplay {
    message: String,
    error_code: Option<&'static str>,
    icon: String,
}

impl FieldErrorDisplay {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: None,
            icon: ERROR_ICON_DEFAULT.to_string(),
        }
    }

    /// Create from an error code and message.
    #[must_use]
    pub fn with_code(error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            error_code: Some(error_code),
            ..Self::new(message)
        }
    }

    /// Set a custom icon (default: "⚠").
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn error_code(&self) -> Option<&'static str> {
        self.error_code
    }

    /// Width needed to show icon and message without truncation.
    #[must_use]
    pub fn min_width(&self) -> usize {
        let icon = display_width(&self.icon);
        if self.message.is_empty() {
            icon
        } else {
            icon + 1 + display_width(&self.message)
        }
    }

    /// Render as one line of at most `width` columns.
    #[must_use]
    pub fn render_line(&self, width: usize) -> String {
        let icon_width = display_width(&self.icon);
        if width < icon_width {
            return String::new();
        }
        if self.message.is_empty() || width < icon_width + 2 {
            return self.icon.clone();
        }
        let room = width - icon_width - 1;
        format!("{} {}", self.icon, truncate(&self.message, room))
    }

    /// Markup of the feedback node.
    #[must_use]
    pub fn to_html(&self) -> String {
        let code = self
            .error_code
            .map(|c| format!(" data-error-code=\"{c}\""))
            .unwrap_or_default();
        format!(
            "<div class=\"{FEEDBACK_CLASS}\" style=\"display:block\"{code}>{}</div>",
            sanitize(&self.message)
        )
    }
}
