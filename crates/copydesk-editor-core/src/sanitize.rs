//! Whitelist HTML sanitization.
//!
//! Every HTML value passes through [`HtmlPolicy::clean`] before it is installed
//! into the surface or stored as history. Disallowed elements are unwrapped
//! rather than dropped, so their text survives as inert markup-free text.

use std::collections::{HashMap, HashSet};

use ammonia::Builder;

use crate::surface::Surface;

/// Elements allowed through the sanitizer.
pub const ALLOWED_TAGS: &[&str] = &[
    "p",
    "br",
    "b",
    "i",
    "u",
    "strong",
    "em",
    "a",
    "ul",
    "ol",
    "li",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "code",
    "pre",
    "span",
    "div",
];

/// Attributes allowed on any allowed element.
pub const ALLOWED_ATTRIBUTES: &[&str] = &["href", "target", "rel", "class", "style"];

/// The editor's sanitization policy, built once and reused.
pub struct HtmlPolicy {
    builder: Builder<'static>,
}

impl Default for HtmlPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HtmlPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlPolicy")
            .field("tags", &ALLOWED_TAGS)
            .field("attributes", &ALLOWED_ATTRIBUTES)
            .finish()
    }
}

impl HtmlPolicy {
    pub fn new() -> Self {
        let mut builder = Builder::default();
        builder
            .tags(ALLOWED_TAGS.iter().copied().collect())
            // Keep the text of every removed element, script and style included.
            .clean_content_tags(HashSet::new())
            .tag_attributes(HashMap::new())
            .generic_attributes(ALLOWED_ATTRIBUTES.iter().copied().collect())
            // `rel` is author-controlled; no automatic rewriting.
            .link_rel(None)
            .strip_comments(true);
        Self { builder }
    }

    /// Sanitize `html` according to the whitelist.
    pub fn clean(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }

    /// Sanitize, then normalize through the surface serializer so the result
    /// compares equal to what the surface itself would serialize.
    pub fn trusted(&self, html: &str) -> String {
        Surface::from_html(&self.clean(html)).html()
    }
}

/// Sanitize with a freshly built [`HtmlPolicy`].
pub fn sanitize_html(html: &str) -> String {
    HtmlPolicy::new().clean(html)
}

/// Sanitize and normalize with a freshly built [`HtmlPolicy`].
pub fn trusted_html(html: &str) -> String {
    HtmlPolicy::new().trusted(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_is_unwrapped_not_executable() {
        let out = sanitize_html("<script>alert(1)</script><p>safe</p>");
        assert!(!out.contains("<script"));
        assert!(out.contains("<p>safe</p>"));
        assert!(out.contains("alert(1)"));
    }

    #[test]
    fn test_disallowed_attributes_removed() {
        let out = sanitize_html(r#"<p onclick="steal()" style="color: red" id="x">hi</p>"#);
        assert_eq!(out, r#"<p style="color: red">hi</p>"#);
    }

    #[test]
    fn test_link_attributes_kept_and_bad_scheme_dropped() {
        let out = sanitize_html(
            r#"<a href="https://example.com" target="_blank" rel="noopener">ok</a><a href="javascript:alert(1)">bad</a>"#,
        );
        assert!(out.contains(r#"href="https://example.com""#));
        assert!(out.contains(r#"target="_blank""#));
        assert!(out.contains(r#"rel="noopener""#));
        assert!(!out.contains("javascript:"));
        assert!(out.contains("bad"));
    }

    #[test]
    fn test_unknown_containers_unwrapped() {
        insta::assert_snapshot!(
            sanitize_html("<section><h2>Title</h2><img src=x onerror=alert(1)><p>body</p></section>"),
            @"<h2>Title</h2><p>body</p>"
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "<script>alert(1)</script><p>safe</p>",
            r#"<p class="x" data-id="1">a <b>b</b> <i>c</i> <u>d</u></p>"#,
            "<ul><li>one<li>two</ul><ol><li>three</li></ol>",
            r#"<div style="text-align: center"><span>mixed &amp; &lt;escaped&gt;</span></div>"#,
            "<h1>t</h1><blockquote><pre><code>x &lt; y</code></pre></blockquote>",
            "<iframe src=evil></iframe>text<!-- note --><br>more",
        ];
        for sample in samples {
            let once = sanitize_html(sample);
            assert_eq!(sanitize_html(&once), once, "not idempotent for {sample}");
        }
    }

    #[test]
    fn test_trusted_matches_surface_serialization() {
        let policy = HtmlPolicy::new();
        let trusted = policy.trusted("<p>a&nbsp;b <strong>c</strong></p>");
        assert_eq!(Surface::from_html(&trusted).html(), trusted);
        assert_eq!(policy.trusted(&trusted), trusted);
    }
}
