#![forbid(unsafe_code)]

//! The document contract the form pipeline depends on.
//!
//! The pipeline treats the page as an external rendering target. It reads
//! field state through [`FormDocument`] on every validation pass (nothing is
//! cached) and writes error markers and submit-control state back. The error
//! marker on a field *is* that field's error state; there is no shadow copy.
//!
//! [`MemoryDocument`] is a complete in-memory implementation used by tests,
//! the simulator and the demo binary.
//!
//! # Invariants
//!
//! 1. **Isolation**: showing or clearing one field's error never touches any
//!    other field.
//! 2. **Feedback reuse**: a field has at most one feedback node; showing an
//!    error again updates it in place.
//! 3. **Clear keeps the node**: clearing hides the feedback node rather than
//!    removing it.

use std::collections::BTreeSet;

use crate::id::FieldId;

/// Class marking a field as invalid.
pub const ERROR_CLASS: &str = "is-invalid";

/// Class of the feedback node placed next to an invalid field.
pub const FEEDBACK_CLASS: &str = "invalid-feedback";

/// Value a checked checkbox contributes when it has no explicit value.
pub const DEFAULT_CHECKBOX_VALUE: &str = "on";

/// Raw control type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlKind {
    /// Text inputs, text areas and selects.
    #[default]
    TextLike,
    /// A checkbox with a checked/unchecked state.
    Checkbox,
}

/// Point-in-time view of a field's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSnapshot {
    /// Identity used for rule lookup.
    pub id: FieldId,
    /// Payload key. `None` excludes the field from the payload.
    pub name: Option<String>,
    /// Raw control type.
    pub kind: ControlKind,
    /// Raw (untrimmed) value.
    pub value: String,
    /// Checked state; meaningful for checkboxes only.
    pub checked: bool,
    /// Whether the field carries the `required` attribute.
    pub required: bool,
}

impl FieldSnapshot {
    /// A text-like field named after its id.
    #[must_use]
    pub fn text(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: Some(id.clone()),
            id: FieldId::new(id),
            kind: ControlKind::TextLike,
            value: String::new(),
            checked: false,
            required: false,
        }
    }

    /// An unchecked checkbox named after its id.
    #[must_use]
    pub fn checkbox(id: impl Into<String>) -> Self {
        Self {
            kind: ControlKind::Checkbox,
            value: DEFAULT_CHECKBOX_VALUE.to_string(),
            ..Self::text(id)
        }
    }

    /// Mark the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the payload key.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Exclude the field from the payload.
    #[must_use]
    pub fn unnamed(mut self) -> Self {
        self.name = None;
        self
    }

    /// Set the raw value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the checked state.
    #[must_use]
    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Whether this is a checkbox.
    #[must_use]
    pub fn is_checkbox(&self) -> bool {
        self.kind == ControlKind::Checkbox
    }
}

/// Host page operations the form pipeline relies on.
pub trait FormDocument {
    /// Ids of every field participating in validation, in document order.
    fn field_ids(&self) -> Vec<FieldId>;

    /// Current state of a field.
    fn field(&self, id: &FieldId) -> Option<FieldSnapshot>;

    /// Mark a field invalid and show `message` in its feedback node.
    fn show_field_error(&mut self, id: &FieldId, message: &str);

    /// Remove a field's invalid marker and hide its feedback node.
    fn clear_field_error(&mut self, id: &FieldId);

    /// Fields currently carrying the invalid marker.
    fn invalid_fields(&self) -> Vec<FieldId>;

    /// Visible label of the submit control, if the form has one.
    fn submit_label(&self) -> Option<String>;

    /// Replace the submit control's visible label.
    fn set_submit_label(&mut self, label: &str);

    /// Enable or disable the submit control.
    fn set_submit_enabled(&mut self, enabled: bool);

    /// Snapshots of every participating field, in document order.
    fn fields(&self) -> Vec<FieldSnapshot> {
        self.field_ids()
            .iter()
            .filter_map(|id| self.field(id))
            .collect()
    }
}

/// Feedback node rendered next to an invalid field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackNode {
    pub text: String,
    pub visible: bool,
}

/// The form's submit button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub label: String,
    pub enabled: bool,
}

/// A field element in a [`MemoryDocument`].
#[derive(Debug, Clone)]
pub struct MemoryField {
    pub snapshot: FieldSnapshot,
    pub classes: BTreeSet<String>,
    pub feedback: Option<FeedbackNode>,
}

/// In-memory form document.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    fields: Vec<MemoryField>,
    submit: Option<SubmitControl>,
}

impl MemoryDocument {
    /// Create an empty document without a submit control.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    #[must_use]
    pub fn with_field(mut self, snapshot: FieldSnapshot) -> Self {
        self.fields.push(MemoryField {
            snapshot,
            classes: BTreeSet::new(),
            feedback: None,
        });
        self
    }

    /// Add a submit control with the given label.
    #[must_use]
    pub fn with_submit(mut self, label: impl Into<String>) -> Self {
        self.submit = Some(SubmitControl {
            label: label.into(),
            enabled: true,
        });
        self
    }

    /// Set a field's raw value. Returns `false` if the field does not exist.
    pub fn set_value(&mut self, id: &FieldId, value: impl Into<String>) -> bool {
        match self.find_mut(id) {
            Some(field) => {
                field.snapshot.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Set a checkbox's checked state. Returns `false` if the field does not exist.
    pub fn set_checked(&mut self, id: &FieldId, checked: bool) -> bool {
        match self.find_mut(id) {
            Some(field) => {
                field.snapshot.checked = checked;
                true
            }
            None => false,
        }
    }

    /// Whether a field carries the invalid marker.
    #[must_use]
    pub fn has_error(&self, id: &FieldId) -> bool {
        self.find(id)
            .is_some_and(|field| field.classes.contains(ERROR_CLASS))
    }

    /// The visible feedback text of a field, if any.
    #[must_use]
    pub fn visible_feedback(&self, id: &FieldId) -> Option<&str> {
        self.find(id)
            .and_then(|field| field.feedback.as_ref())
            .filter(|node| node.visible)
            .map(|node| node.text.as_str())
    }

    /// The feedback node of a field, visible or not.
    #[must_use]
    pub fn feedback(&self, id: &FieldId) -> Option<&FeedbackNode> {
        self.find(id).and_then(|field| field.feedback.as_ref())
    }

    /// The submit control.
    #[must_use]
    pub fn submit(&self) -> Option<&SubmitControl> {
        self.submit.as_ref()
    }

    /// The field element with the given id.
    #[must_use]
    pub fn element(&self, id: &FieldId) -> Option<&MemoryField> {
        self.find(id)
    }

    fn find(&self, id: &FieldId) -> Option<&MemoryField> {
        self.fields.iter().find(|f| &f.snapshot.id == id)
    }

    fn find_mut(&mut self, id: &FieldId) -> Option<&mut MemoryField> {
        self.fields.iter_mut().find(|f| &f.snapshot.id == id)
    }
}

impl FormDocument for MemoryDocument {
    fn field_ids(&self) -> Vec<FieldId> {
        self.fields.iter().map(|f| f.snapshot.id.clone()).collect()
    }

    fn field(&self, id: &FieldId) -> Option<FieldSnapshot> {
        self.find(id).map(|f| f.snapshot.clone())
    }

    fn show_field_error(&mut self, id: &FieldId, message: &str) {
        let Some(field) = self.find_mut(id) else {
            return;
        };
        field.classes.insert(ERROR_CLASS.to_string());
        let node = field.feedback.get_or_insert_with(|| FeedbackNode {
            text: String::new(),
            visible: false,
        });
        node.text = message.to_string();
        node.visible = true;
    }

    fn clear_field_error(&mut self, id: &FieldId) {
        let Some(field) = self.find_mut(id) else {
            return;
        };
        field.classes.remove(ERROR_CLASS);
        if let Some(node) = field.feedback.as_mut() {
            node.visible = false;
        }
    }

    fn invalid_fields(&self) -> Vec<FieldId> {
        self.fields
            .iter()
            .filter(|f| f.classes.contains(ERROR_CLASS))
            .map(|f| f.snapshot.id.clone())
            .collect()
    }

    fn submit_label(&self) -> Option<String> {
        self.submit.as_ref().map(|s| s.label.clone())
    }

    fn set_submit_label(&mut self, label: &str) {
        if let Some(submit) = self.submit.as_mut() {
            submit.label = label.to_string();
        }
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        if let Some(submit) = self.submit.as_mut() {
            submit.enabled = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> MemoryDocument {
        MemoryDocument::new()
            .with_field(FieldSnapshot::text("firstName").required())
            .with_field(FieldSnapshot::text("email").required())
            .with_field(FieldSnapshot::checkbox("privacy").required())
            .with_submit("Send")
    }

    #[test]
    fn show_error_marks_field_and_creates_feedback() {
        let mut d = doc();
        let id = FieldId::from("email");
        d.show_field_error(&id, "Invalid email");
        assert!(d.has_error(&id));
        assert_eq!(d.visible_feedback(&id), Some("Invalid email"));
        assert_eq!(d.invalid_fields(), vec![id]);
    }

    #[test]
    fn show_error_twice_reuses_feedback_node() {
        let mut d = doc();
        let id = FieldId::from("email");
        d.show_field_error(&id, "first");
        d.show_field_error(&id, "second");
        assert_eq!(d.visible_feedback(&id), Some("second"));
    }

    #[test]
    fn clear_hides_but_keeps_node() {
        let mut d = doc();
        let id = FieldId::from("firstName");
        d.show_field_error(&id, "Required");
        d.clear_field_error(&id);
        assert!(!d.has_error(&id));
        assert_eq!(d.visible_feedback(&id), None);
        let node = d.feedback(&id).expect("node is kept");
        assert!(!node.visible);
    }

    #[test]
    fn clearing_one_field_leaves_others() {
        let mut d = doc();
        let a = FieldId::from("firstName");
        let b = FieldId::from("email");
        d.show_field_error(&a, "A");
        d.show_field_error(&b, "B");
        d.clear_field_error(&a);
        assert!(d.has_error(&b));
        assert_eq!(d.visible_feedback(&b), Some("B"));
    }

    #[test]
    fn checkbox_defaults_to_on_value() {
        let d = doc();
        let privacy = d.field(&FieldId::from("privacy")).expect("field exists");
        assert!(privacy.is_checkbox());
        assert_eq!(privacy.value, DEFAULT_CHECKBOX_VALUE);
        assert!(!privacy.checked);
    }

    #[test]
    fn submit_control_label_and_state() {
        let mut d = doc();
        d.set_submit_enabled(false);
        d.set_submit_label("Sending...");
        let submit = d.submit().expect("submit exists");
        assert!(!submit.enabled);
        assert_eq!(submit.label, "Sending...");
    }

    #[test]
    fn unknown_field_is_ignored() {
        let mut d = doc();
        let ghost = FieldId::from("ghost");
        d.show_field_error(&ghost, "x");
        assert!(d.invalid_fields().is_empty());
        assert!(!d.set_value(&ghost, "v"));
    }
}
