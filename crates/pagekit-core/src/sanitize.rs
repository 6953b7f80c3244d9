#![forbid(unsafe_code)]

//! Markup-safe text encoding.
//!
//! [`sanitize`] turns arbitrary text into a form that can be injected as
//! markup without being interpreted: every markup-significant character is
//! replaced by its HTML entity. It is a total function (the empty string
//! maps to itself) and performs no allocation beyond the returned buffer.
//!
//! Form values are sanitized before they enter a payload, and every free-text
//! message is sanitized before it reaches the notification stack.

/// HTML-escape `text` into a new string.
///
/// ```
/// use pagekit_core::sanitize;
///
/// assert_eq!(sanitize("<b>Tom & Jerry</b>"), "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;");
/// assert_eq!(sanitize(""), "");
/// ```
#[must_use]
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    sanitize_into(&mut out, text);
    out
}

/// HTML-escape `text` into the output buffer.
pub fn sanitize_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(sanitize("Hello world"), "Hello world");
        assert_eq!(sanitize("Grüße aus Köln"), "Grüße aus Köln");
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            sanitize(r#"<script>alert("x")</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
        );
        assert_eq!(sanitize("O'Brien"), "O&#39;Brien");
    }

    #[test]
    fn ampersand_is_escaped_first_class() {
        // An existing entity must not survive as an entity.
        assert_eq!(sanitize("&lt;"), "&amp;lt;");
    }

    #[test]
    fn non_breaking_space_is_named() {
        assert_eq!(sanitize("a\u{a0}b"), "a&nbsp;b");
    }

    #[test]
    fn sanitize_into_appends() {
        let mut out = String::from("x=");
        sanitize_into(&mut out, "<");
        assert_eq!(out, "x=&lt;");
    }
}
