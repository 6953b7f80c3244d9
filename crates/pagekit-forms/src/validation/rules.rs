#![forbid(unsafe_code)]

//! Binding of field identities to pattern rules.
//!
//! A [`RuleSet`] maps a field id to exactly one text validator. Fields
//! without a binding are only checked for required-ness (and acceptance, for
//! checkboxes).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use pagekit_core::{FieldId, FormMessages};

use super::validators::{Pattern, Validator};

/// Field ids used by the contact form.
pub mod contact {
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const MESSAGE: &str = "message";
    pub const PRIVACY: &str = "privacy";

    /// Label of the contact form's submit control.
    pub const SUBMIT_LABEL: &str = "Send message";

    /// An empty contact form: every field required except the phone
    /// number, and a required privacy checkbox.
    #[must_use]
    pub fn blank_document() -> pagekit_core::MemoryDocument {
        use pagekit_core::{FieldSnapshot, MemoryDocument};

        MemoryDocument::new()
            .with_field(FieldSnapshot::text(FIRST_NAME).required())
            .with_field(FieldSnapshot::text(LAST_NAME).required())
            .with_field(FieldSnapshot::text(EMAIL).required())
            .with_field(FieldSnapshot::text(PHONE))
            .with_field(FieldSnapshot::text(MESSAGE).required())
            .with_field(FieldSnapshot::checkbox(PRIVACY).required())
            .with_submit(SUBMIT_LABEL)
    }
}

/// Shared text validator.
pub type TextRule = Arc<dyn Validator<str>>;

/// Field id to rule bindings.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<FieldId, TextRule>,
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.rules
                    .iter()
                    .map(|(id, rule)| (id.as_str(), rule.error_message())),
            )
            .finish()
    }
}

impl RuleSet {
    /// No bindings: every field is checked for required-ness only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The contact form rules: both name fields share the name pattern with
    /// field-specific messages; email, phone and message have their own.
    #[must_use]
    pub fn contact_form(messages: &FormMessages) -> Self {
        Self::new()
            .bind(contact::FIRST_NAME, Pattern::name(&messages.first_name))
            .bind(contact::LAST_NAME, Pattern::name(&messages.last_name))
            .bind(contact::EMAIL, Pattern::email(&messages.email))
            .bind(contact::PHONE, Pattern::phone(&messages.phone))
            .bind(contact::MESSAGE, Pattern::message(&messages.message))
    }

    /// Bind `rule` to `field`, replacing any earlier binding.
    #[must_use]
    pub fn bind(mut self, field: impl Into<FieldId>, rule: impl Validator<str> + 'static) -> Self {
        self.insert(field, Arc::new(rule));
        self
    }

    /// Bind a shared rule, returning the one it replaced.
    pub fn insert(&mut self, field: impl Into<FieldId>, rule: TextRule) -> Option<TextRule> {
        self.rules.insert(field.into(), rule)
    }

    /// Remove a binding.
    pub fn remove(&mut self, field: &FieldId) -> Option<TextRule> {
        self.rules.remove(field)
    }

    /// Rule bound to `field`, if any.
    #[must_use]
    pub fn get(&self, field: &FieldId) -> Option<&dyn Validator<str>> {
        self.rules.get(field).map(|rule| rule.as_ref())
    }

    /// Bound field ids in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldId> {
        self.rules.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_rules_cover_pattern_fields() {
        let rules = RuleSet::contact_form(&FormMessages::default());
        let fields: Vec<&str> = rules.fields().map(FieldId::as_str).collect();
        assert_eq!(fields, vec!["email", "firstName", "lastName", "message", "phone"]);
        assert!(rules.get(&contact::PRIVACY.into()).is_none());
    }

    #[test]
    fn name_fields_keep_their_own_messages() {
        let messages = FormMessages::default();
        let rules = RuleSet::contact_form(&messages);
        let first = rules.get(&"firstName".into()).map(|r| r.validate("1"));
        let last = rules.get(&"lastName".into()).map(|r| r.validate("1"));
        assert_eq!(
            first.as_ref().and_then(|r| r.error_message()),
            Some(messages.first_name.as_str())
        );
        assert_eq!(
            last.as_ref().and_then(|r| r.error_message()),
            Some(messages.last_name.as_str())
        );
    }

    #[test]
    fn bind_replaces_existing_rule() {
        let zip = Pattern::new(r"^\d{5}$", "zip").expect("valid pattern");
        let mut rules = RuleSet::new().bind("zip", zip);
        assert_eq!(rules.len(), 1);
        let previous = rules.insert("zip", Arc::new(Pattern::phone("phone")));
        assert_eq!(previous.map(|r| r.error_message().to_string()), Some("zip".into()));
        assert_eq!(rules.get(&"zip".into()).map(|r| r.error_message()), Some("phone"));
        assert!(rules.remove(&"zip".into()).is_some());
        assert!(rules.is_empty());
    }
}
