//! Escaping helpers for emitted markup.

/// Escape HTML special characters in text and attribute values
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Wraps `body` in CDATA, splitting it wherever it contains the `]]>` terminator.
pub fn cdata_section(body: &str) -> String {
    format!("<![CDATA[{}]]>", body.replace("]]>", "]]]]><![CDATA[>"))
}
