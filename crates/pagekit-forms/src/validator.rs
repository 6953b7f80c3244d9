#![forbid(unsafe_code)]

//! Single-field validation policy.
//!
//! [`FieldValidator::validate`] is the one policy used for both blur-time
//! and submit-time checks. Checks run in order and the first failure wins:
//!
//! 1. Required and blank: the required error.
//! 2. Blank and optional: valid.
//! 3. A pattern rule is bound to the field id and the value does not match:
//!    the rule's error.
//! 4. Required checkbox left unchecked: the acceptance error.
//! 5. Otherwise valid.
//!
//! # Invariants
//!
//! 1. The required check precedes every pattern check.
//! 2. Blank optional fields are valid whatever rule is bound to them.
//! 3. Validation is a pure function of the [`FieldSpec`].

use pagekit_core::FormMessages;

use crate::field::FieldSpec;
use crate::validation::{Acceptance, Required, RuleSet, ValidationResult, Validator};

/// Applies the validation policy to one field at a time.
#[derive(Debug, Clone)]
pub struct FieldValidator {
    rules: RuleSet,
    required: Required,
    acceptance: Acceptance,
}

impl FieldValidator {
    /// Validator with custom rule bindings.
    #[must_use]
    pub fn new(rules: RuleSet, messages: &FormMessages) -> Self {
        Self {
            rules,
            required: Required::new(&messages.required),
            acceptance: Acceptance::new(&messages.acceptance),
        }
    }

    /// The contact form policy.
    #[must_use]
    pub fn contact_form(messages: &FormMessages) -> Self {
        Self::new(RuleSet::contact_form(messages), messages)
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleSet {
        &mut self.rules
    }

    /// Validate one field.
    #[must_use]
    pub fn validate(&self, field: &FieldSpec) -> ValidationResult {
        let blank = field.value.is_empty();
        if field.required && blank {
            return self.required.validate(&field.value);
        }
        if blank {
            return ValidationResult::Valid;
        }
        if let Some(rule) = self.rules.get(&field.id) {
            let result = rule.validate(&field.value);
            if result.is_invalid() {
                return result;
            }
        }
        if field.is_checkbox() && field.required {
            return self.acceptance.validate(&field.checked);
        }
        ValidationResult::Valid
    }
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::contact_form(&FormMessages::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{ERROR_CODE_ACCEPTANCE, ERROR_CODE_PATTERN, ERROR_CODE_REQUIRED};

    fn code(result: &ValidationResult) -> Option<&'static str> {
        result.error().map(|e| e.code)
    }

    #[test]
    fn required_precedes_pattern() {
        let v = FieldValidator::default();
        let result = v.validate(&FieldSpec::text("email", "   ", true));
        assert_eq!(code(&result), Some(ERROR_CODE_REQUIRED));
        assert_eq!(result.error_message(), Some(FormMessages::default().required.as_str()));
    }

    #[test]
    fn blank_optional_field_is_valid() {
        let v = FieldValidator::default();
        assert!(v.validate(&FieldSpec::text("phone", "", false)).is_valid());
        assert!(v.validate(&FieldSpec::text("email", "  ", false)).is_valid());
    }

    #[test]
    fn pattern_failure_uses_field_message() {
        let messages = FormMessages::default();
        let v = FieldValidator::contact_form(&messages);
        let result = v.validate(&FieldSpec::text("lastName", "X", true));
        assert_eq!(code(&result), Some(ERROR_CODE_PATTERN));
        assert_eq!(result.error_message(), Some(messages.last_name.as_str()));
    }

    #[test]
    fn unbound_fields_only_check_required() {
        let v = FieldValidator::default();
        assert!(v.validate(&FieldSpec::text("company", "x", true)).is_valid());
    }

    #[test]
    fn value_is_checked_trimmed() {
        let v = FieldValidator::default();
        assert!(v.validate(&FieldSpec::text("email", "  a@b.co  ", true)).is_valid());
    }

    #[test]
    fn required_checkbox_must_be_checked() {
        let v = FieldValidator::default();
        let unchecked = v.validate(&FieldSpec::checkbox("privacy", false, true));
        assert_eq!(code(&unchecked), Some(ERROR_CODE_ACCEPTANCE));
        assert!(v.validate(&FieldSpec::checkbox("privacy", true, true)).is_valid());
        assert!(v.validate(&FieldSpec::checkbox("newsletter", false, false)).is_valid());
    }
}
