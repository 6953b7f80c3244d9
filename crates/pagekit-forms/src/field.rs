#![forbid(unsafe_code)]

//! The validation view of a form control.

use pagekit_core::{ControlKind, FieldId, FieldSnapshot};

/// A field as the validator sees it.
///
/// Built fresh from the live document on every pass; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Identity used for rule lookup.
    pub id: FieldId,
    /// Value with surrounding whitespace removed.
    pub value: String,
    pub required: bool,
    pub kind: ControlKind,
    /// Checked state; always `false` for text-like controls.
    pub checked: bool,
}

impl FieldSpec {
    /// A required or optional text-like field.
    #[must_use]
    pub fn text(id: impl Into<FieldId>, value: &str, required: bool) -> Self {
        Self {
            id: id.into(),
            value: value.trim().to_string(),
            required,
            kind: ControlKind::TextLike,
            checked: false,
        }
    }

    /// A checkbox.
    #[must_use]
    pub fn checkbox(id: impl Into<FieldId>, checked: bool, required: bool) -> Self {
        Self {
            kind: ControlKind::Checkbox,
            checked,
            ..Self::text(id, pagekit_core::DEFAULT_CHECKBOX_VALUE, required)
        }
    }

    #[must_use]
    pub fn is_checkbox(&self) -> bool {
        self.kind == ControlKind::Checkbox
    }
}

impl From<&FieldSnapshot> for FieldSpec {
    fn from(snapshot: &FieldSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            value: snapshot.value.trim().to_string(),
            required: snapshot.required,
            kind: snapshot.kind,
            checked: snapshot.is_checkbox() && snapshot.checked,
        }
    }
}
