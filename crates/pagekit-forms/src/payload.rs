#![forbid(unsafe_code)]

//! Submitted form data.

use std::collections::BTreeMap;

use pagekit_core::{FieldSnapshot, sanitize};

/// Flat, sorted mapping from field name to sanitized value.
///
/// Built the way a browser collects form data: unnamed fields are skipped,
/// checkboxes contribute only when checked, and a later field with the same
/// name overwrites an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "json",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct FormPayload {
    values: BTreeMap<String, String>,
}

impl FormPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the payload from field snapshots.
    #[must_use]
    pub fn collect<'a>(fields: impl IntoIterator<Item = &'a FieldSnapshot>) -> Self {
        let mut payload = Self::new();
        for field in fields {
            let Some(name) = field.name.as_deref() else {
                continue;
            };
            if field.is_checkbox() && !field.checked {
                continue;
            }
            payload.insert(name, &field.value);
        }
        payload
    }

    /// Insert a value, sanitizing it.
    pub fn insert(&mut self, name: &str, raw: &str) {
        self.values.insert(name.to_string(), sanitize(raw));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize as a JSON object.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_like_a_browser() {
        let fields = [
            FieldSnapshot::text("firstName").with_value(" Anna "),
            FieldSnapshot::text("notes").with_value("<b>hi</b>"),
            FieldSnapshot::text("honeypot").unnamed().with_value("bot"),
            FieldSnapshot::checkbox("privacy").with_checked(true),
            FieldSnapshot::checkbox("newsletter"),
        ];
        let payload = FormPayload::collect(&fields);
        assert_eq!(payload.get("firstName"), Some(" Anna "));
        assert_eq!(payload.get("notes"), Some("&lt;b&gt;hi&lt;/b&gt;"));
        assert_eq!(payload.get("privacy"), Some("on"));
        assert_eq!(payload.get("newsletter"), None);
        assert_eq!(payload.get("honeypot"), None);
        let names: Vec<&str> = payload.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["firstName", "notes", "privacy"]);
    }

    #[test]
    fn later_duplicate_name_wins() {
        let fields = [
            FieldSnapshot::text("a").named("topic").with_value("one"),
            FieldSnapshot::text("b").named("topic").with_value("two"),
        ];
        assert_eq!(FormPayload::collect(&fields).get("topic"), Some("two"));
    }

    #[cfg(feature = "json")]
    #[test]
    fn serializes_as_flat_object() {
        let mut payload = FormPayload::new();
        payload.insert("email", "a@b.co");
        payload.insert("message", "\"quoted\"");
        assert_eq!(
            payload.to_json().expect("serializable"),
            r#"{"email":"a@b.co","message":"&quot;quoted&quot;"}"#
        );
    }
}
