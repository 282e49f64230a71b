//! Format conversions: markdown to HTML, HTML to plain text.
//!
//! All three transforms are total. Malformed input produces odd-looking output,
//! never an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::surface::{NodeData, NodeId, Surface, is_block_tag, is_heading_tag};

/// Bullet prefix for list items in the plain-text projection.
pub const BULLET: &str = "• ";

macro_rules! pattern {
    ($name:ident, $re:literal) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("static markdown pattern"));
    };
}

pattern!(BOLD_STARS, r"\*\*(.+?)\*\*");
pattern!(BOLD_UNDERSCORES, r"__(.+?)__");
pattern!(ITALIC_STAR, r"\*(.+?)\*");
pattern!(ITALIC_UNDERSCORE, r"_(.+?)_");
pattern!(HEADING_3, r"(?m)^### (.*)$");
pattern!(HEADING_2, r"(?m)^## (.*)$");
pattern!(HEADING_1, r"(?m)^# (.*)$");

/// Convert the markdown subset the editor understands into HTML.
///
/// Bold is resolved before italic so `**x**` is not read as two empty
/// italics. Headings are matched per line before newlines become `<br>`.
/// The output is not sanitized; callers pass it through the policy.
pub fn markdown_to_html(text: &str) -> String {
    let html = BOLD_STARS.replace_all(text, "<strong>$1</strong>");
    let html = BOLD_UNDERSCORES.replace_all(&html, "<strong>$1</strong>");
    let html = ITALIC_STAR.replace_all(&html, "<em>$1</em>");
    let html = ITALIC_UNDERSCORE.replace_all(&html, "<em>$1</em>");
    let html = HEADING_3.replace_all(&html, "<h3>$1</h3>");
    let html = HEADING_2.replace_all(&html, "<h2>$1</h2>");
    let html = HEADING_1.replace_all(&html, "<h1>$1</h1>");
    html.replace('\n', "<br>")
}

/// Plain-text projection of an HTML fragment.
pub fn html_to_plain_text(html: &str) -> String {
    let surface = Surface::from_html(html);
    plain_text(&surface, surface.root())
}

/// Plain-text projection of everything beneath `id`.
///
/// This is the canonical "text of the document": it is what goes into the
/// plain half of history and what the host receives on close.
pub fn plain_text(surface: &Surface, id: NodeId) -> String {
    let mut out = String::new();
    for &child in surface.children(id) {
        project(surface, child, &mut out);
    }
    out.trim().to_string()
}

fn project(surface: &Surface, id: NodeId, out: &mut String) {
    let project_children = |out: &mut String| {
        for &child in surface.children(id) {
            project(surface, child, out);
        }
    };
    match surface.data(id) {
        Some(NodeData::Text(text)) => out.push_str(text),
        Some(NodeData::Element(el)) => match el.tag.as_str() {
            "br" => out.push('\n'),
            "p" | "div" => {
                project_children(out);
                out.push('\n');
            }
            tag if is_heading_tag(tag) => {
                project_children(out);
                out.push_str("\n\n");
            }
            "li" => {
                out.push_str(BULLET);
                project_children(out);
                out.push('\n');
            }
            "ul" | "ol" => {
                project_children(out);
                out.push('\n');
            }
            _ => project_children(out),
        },
        None => {}
    }
}

/// Approximation of a rendered element's `innerText`: block boundaries become
/// single line breaks, no list markers.
pub fn inner_text(surface: &Surface, id: NodeId) -> String {
    let mut out = String::new();
    for &child in surface.children(id) {
        render_text(surface, child, &mut out);
    }
    out.trim().to_string()
}

fn render_text(surface: &Surface, id: NodeId, out: &mut String) {
    match surface.data(id) {
        Some(NodeData::Text(text)) => out.push_str(text),
        Some(NodeData::Element(el)) if el.tag == "br" => out.push('\n'),
        Some(NodeData::Element(el)) => {
            let block = is_block_tag(&el.tag);
            if block {
                line_break(out);
            }
            for &child in surface.children(id) {
                render_text(surface, child, out);
            }
            if block {
                line_break(out);
            }
        }
        None => {}
    }
}

fn line_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_sample() {
        insta::assert_snapshot!(
            markdown_to_html("**bold** and *italic*\n# Title"),
            @"<strong>bold</strong> and <em>italic</em><br><h1>Title</h1>"
        );
    }

    #[test]
    fn test_markdown_underscores_and_levels() {
        assert_eq!(
            markdown_to_html("__strong__ _soft_\n## Two\n### Three"),
            "<strong>strong</strong> <em>soft</em><br><h2>Two</h2><br><h3>Three</h3>"
        );
    }

    #[test]
    fn test_markdown_heading_needs_line_start() {
        assert_eq!(markdown_to_html("not # a heading"), "not # a heading");
        assert_eq!(markdown_to_html("#nospace"), "#nospace");
    }

    #[test]
    fn test_markdown_unbalanced_is_total() {
        assert_eq!(markdown_to_html("**open only"), "**open only");
        assert_eq!(markdown_to_html("a * b"), "a * b");
        assert_eq!(markdown_to_html(""), "");
    }

    #[test]
    fn test_plain_text_heading_then_paragraph() {
        assert_eq!(html_to_plain_text("<h1>Title</h1><p>Body</p>"), "Title\n\nBody");
    }

    #[test]
    fn test_plain_text_is_deterministic() {
        let html = "<p>a<br>b</p><ol><li>x</li><li><em>y</em></li></ol><div>z</div>";
        let first = html_to_plain_text(html);
        assert_eq!(first, html_to_plain_text(html));
        assert_eq!(first, "a\nb\n• x\n• y\n\nz");
    }

    #[test]
    fn test_plain_text_strips_markdown_formatting() {
        let html = markdown_to_html("Hello **world**");
        assert_eq!(html_to_plain_text(&html), "Hello world");
    }

    #[test]
    fn test_plain_text_decodes_named_entities() {
        assert_eq!(
            html_to_plain_text("<p>caf&eacute; &copy; 2024&hellip;</p>"),
            "café © 2024…"
        );
    }

    #[test]
    fn test_plain_text_implicitly_closed_items() {
        assert_eq!(html_to_plain_text("<ul><li><b>a<li>b</ul>"), "• a\n• b");
    }

    #[test]
    fn test_inner_text_has_no_bullets() {
        let s = Surface::from_html("<h2>Head</h2><ul><li>one</li><li>two</li></ul>tail");
        assert_eq!(inner_text(&s, s.root()), "Head\none\ntwo\ntail");
    }
}
