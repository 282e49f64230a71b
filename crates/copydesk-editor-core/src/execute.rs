//! Toolbar command execution against the surface.
//!
//! `execute_command` is the single dispatch point for formatting commands.
//! Each transform edits the tree in place and updates the live range so the
//! caller can persist it afterwards. History commands are not handled here;
//! the session owns history.

use crate::actions::{HeadingLevel, ToolbarCommand};
use crate::list;
use crate::selection::end_point;
use crate::surface::{NodeId, Surface, is_block_tag};
use crate::types::{DomPoint, DomRange, compare_points};

/// Blocks that headings and alignment act on directly.
pub(crate) const TEXT_BLOCKS: &[&str] = &["p", "div", "h1", "h2", "h3", "h4", "h5", "h6"];

const ALIGN_BLOCKS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "blockquote",
];

/// Apply `command` around `range`. Returns true if the tree changed.
///
/// On return `range` is always a valid range inside the surface: transforms
/// that discard the nodes it referenced leave the caret at the end of the
/// document.
pub fn execute_command(surface: &mut Surface, range: &mut DomRange, command: ToolbarCommand) -> bool {
    let changed = match command {
        ToolbarCommand::Bold => toggle_inline(surface, range, "strong", &["strong", "b"]),
        ToolbarCommand::Italic => toggle_inline(surface, range, "em", &["em", "i"]),
        ToolbarCommand::Underline => toggle_inline(surface, range, "u", &["u"]),
        ToolbarCommand::Heading(level) => toggle_heading(surface, range, level),
        ToolbarCommand::BulletList | ToolbarCommand::NumberedList => {
            let kind = command.list_tag().unwrap_or("ul");
            list::apply_list(surface, range, kind)
        }
        ToolbarCommand::AlignLeft
        | ToolbarCommand::AlignCenter
        | ToolbarCommand::AlignRight
        | ToolbarCommand::AlignJustify => {
            let value = command.alignment().unwrap_or("left");
            align(surface, range, value)
        }
        ToolbarCommand::Indent => list::indent(surface, range),
        ToolbarCommand::Outdent => list::outdent(surface, range),
        ToolbarCommand::Undo | ToolbarCommand::Redo => false,
    };

    normalize_range(surface, range);
    tracing::debug!(target: "copydesk::command", %command, changed, "executed command");
    changed
}

/// Re-point a range whose nodes were discarded, and clamp offsets that now
/// run past the end of their node.
pub(crate) fn normalize_range(surface: &Surface, range: &mut DomRange) {
    let root = surface.root();
    if !range.is_within(surface, root) {
        *range = DomRange::caret(end_point(surface, root));
        return;
    }
    for point in [&mut range.anchor, &mut range.focus] {
        point.offset = point.offset.min(surface.node_len(point.node));
    }
}

/// The node a point sits "in" for the purpose of finding its block.
///
/// Text points are their own node. An element point resolves to the child
/// after the boundary, or the one before it at the end of the element.
pub(crate) fn point_node(surface: &Surface, point: &DomPoint) -> NodeId {
    if surface.is_text(point.node) {
        return point.node;
    }
    let children = surface.children(point.node);
    children
        .get(point.offset)
        .or_else(|| point.offset.checked_sub(1).and_then(|i| children.get(i)))
        .copied()
        .unwrap_or(point.node)
}

/// The direct child of `container` on the way down to `node`.
pub(crate) fn containing_child(surface: &Surface, container: NodeId, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        let parent = surface.parent(current)?;
        if parent == container {
            return Some(current);
        }
        current = parent;
    }
}

fn is_run_break(surface: &Surface, id: NodeId) -> bool {
    surface
        .tag(id)
        .is_some_and(|tag| tag == "br" || is_block_tag(tag))
}

/// Consecutive inline children of `container` around `node`, bounded by
/// blocks and line breaks. A block child is a run on its own.
pub(crate) fn inline_run(surface: &Surface, container: NodeId, node: NodeId) -> Vec<NodeId> {
    let Some(mut child) = containing_child(surface, container, node) else {
        return Vec::new();
    };
    if surface.tag(child).is_some_and(is_block_tag) {
        return vec![child];
    }
    if surface.is_element(child, "br") {
        // A caret on a break belongs to the line the break ends.
        match surface.previous_sibling(child) {
            Some(prev) if !is_run_break(surface, prev) => child = prev,
            _ => return Vec::new(),
        }
    }

    let mut run = vec![child];
    let mut prev = surface.previous_sibling(child);
    while let Some(id) = prev.filter(|&id| !is_run_break(surface, id)) {
        run.insert(0, id);
        prev = surface.previous_sibling(id);
    }
    let mut next = surface.next_sibling(child);
    while let Some(id) = next.filter(|&id| !is_run_break(surface, id)) {
        run.push(id);
        next = surface.next_sibling(id);
    }
    run
}

/// Wrap the inline run around `node` in a new `tag` element and return it.
///
/// With no run (empty container, or a caret between breaks) an empty
/// element is inserted at the caret's position.
pub(crate) fn wrap_inline_run(
    surface: &mut Surface,
    container: NodeId,
    node: NodeId,
    tag: &str,
) -> NodeId {
    let run = inline_run(surface, container, node);
    let wrapper = surface.create_element(tag);
    match run.first() {
        Some(&first) => surface.insert_before(first, wrapper),
        None => match containing_child(surface, container, node) {
            Some(at) => surface.insert_before(at, wrapper),
            None => surface.append_child(container, wrapper),
        },
    }
    for id in run {
        surface.append_child(wrapper, id);
    }
    wrapper
}

// === Inline formatting ===

fn toggle_inline(surface: &mut Surface, range: &mut DomRange, tag: &str, matches: &[&str]) -> bool {
    if range.is_collapsed() {
        return false;
    }
    let root = surface.root();
    let (start, end) = range.ordered(surface, root);

    let start_el = surface.closest_tag(point_node(surface, &start), root, matches);
    let end_el = surface.closest_tag(point_node(surface, &end), root, matches);
    match (start_el, end_el) {
        (Some(a), Some(b)) if a == b => {
            unwrap_keeping_range(surface, range, a);
            return true;
        }
        _ => {}
    }

    let (start, end) = split_boundaries(surface, start, end);
    let targets: Vec<NodeId> = surface
        .text_nodes(root)
        .into_iter()
        .filter(|&t| surface.node_len(t) > 0)
        .filter(|&t| {
            let first = DomPoint::new(t, 0);
            let last = DomPoint::new(t, surface.node_len(t));
            compare_points(surface, root, &start, &first).is_some_and(|o| o.is_le())
                && compare_points(surface, root, &last, &end).is_some_and(|o| o.is_le())
        })
        .filter(|&t| surface.closest_tag(t, root, matches).is_none())
        .collect();

    let (Some(&first), Some(&last)) = (targets.first(), targets.last()) else {
        return false;
    };
    for &text in &targets {
        surface.wrap_node(text, tag);
    }
    *range = DomRange::new(
        DomPoint::new(first, 0),
        DomPoint::new(last, surface.node_len(last)),
    );
    true
}

/// Split the text nodes at either end of a range so that the range begins
/// and ends on text node boundaries.
fn split_boundaries(surface: &mut Surface, start: DomPoint, end: DomPoint) -> (DomPoint, DomPoint) {
    let mut end = end;
    if surface.is_text(end.node) && end.offset > 0 && end.offset < surface.node_len(end.node) {
        surface.split_text(end.node, end.offset);
    }

    let mut start = start;
    if surface.is_text(start.node) && start.offset > 0 && start.offset < surface.node_len(start.node) {
        if let Some(right) = surface.split_text(start.node, start.offset) {
            if end.node == start.node {
                end = DomPoint::new(right, end.offset - start.offset);
            }
            start = DomPoint::new(right, 0);
        }
    }
    (start, end)
}

fn unwrap_keeping_range(surface: &mut Surface, range: &mut DomRange, element: NodeId) {
    let parent = surface.parent(element);
    let index = surface.index_in_parent(element);
    if let (Some(parent), Some(index)) = (parent, index) {
        for point in [&mut range.anchor, &mut range.focus] {
            if point.node == element {
                *point = DomPoint::new(parent, index + point.offset);
            }
        }
    }
    surface.unwrap_node(element);
}

// === Blocks ===

fn toggle_heading(surface: &mut Surface, range: &mut DomRange, level: HeadingLevel) -> bool {
    let root = surface.root();
    let tag = level.tag();
    let node = point_node(surface, &range.focus);

    if let Some(block) = surface.closest_tag(node, root, TEXT_BLOCKS) {
        let target = if surface.is_element(block, tag) { "p" } else { tag };
        let new = surface.retag(block, target);
        range.remap(block, new);
        return true;
    }

    let container = surface
        .closest_tag(node, root, &["li", "blockquote"])
        .unwrap_or(root);
    let heading = wrap_inline_run(surface, container, node, tag);
    if surface.children(heading).is_empty() {
        *range = DomRange::caret(DomPoint::new(heading, 0));
    }
    true
}

fn align(surface: &mut Surface, range: &mut DomRange, value: &str) -> bool {
    let root = surface.root();
    let node = point_node(surface, &range.focus);
    let block = match surface.closest_tag(node, root, ALIGN_BLOCKS) {
        Some(block) => block,
        None => wrap_inline_run(surface, root, node, "div"),
    };
    set_style_property(surface, block, "text-align", value);
    true
}

/// Set one declaration in an element's inline style, replacing any previous
/// value for the same property.
pub(crate) fn set_style_property(surface: &mut Surface, id: NodeId, property: &str, value: &str) {
    let mut declarations: Vec<String> = surface
        .attr(id, "style")
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            decl.split(':')
                .next()
                .is_none_or(|name| !name.trim().eq_ignore_ascii_case(property))
        })
        .map(String::from)
        .collect();
    declarations.push(format!("{property}: {value}"));
    surface.set_attr(id, "style", declarations.join("; "));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_at(s: &Surface, index: usize, offset: usize) -> DomPoint {
        DomPoint::new(s.text_nodes(s.root())[index], offset)
    }

    fn run(html: &str, range: impl Fn(&Surface) -> DomRange, cmd: ToolbarCommand) -> String {
        let mut s = Surface::from_html(html);
        let mut r = range(&s);
        execute_command(&mut s, &mut r, cmd);
        assert!(r.is_within(&s, s.root()));
        s.html()
    }

    #[test]
    fn test_bold_wraps_partial_selection() {
        let mut s = Surface::from_html("<p>hello world</p>");
        let mut r = DomRange::new(text_at(&s, 0, 6), text_at(&s, 0, 11));
        assert!(execute_command(&mut s, &mut r, ToolbarCommand::Bold));
        assert_eq!(s.html(), "<p>hello <strong>world</strong></p>");
        assert_eq!(s.text(r.anchor.node), Some("world"));
        assert_eq!(r.focus.offset, 5);
    }

    #[test]
    fn test_bold_middle_of_text_backwards_selection() {
        let html = run(
            "<p>abcdef</p>",
            |s| DomRange::new(text_at(s, 0, 4), text_at(s, 0, 2)),
            ToolbarCommand::Bold,
        );
        assert_eq!(html, "<p>ab<strong>cd</strong>ef</p>");
    }

    #[test]
    fn test_italic_across_blocks() {
        let html = run(
            "<p>one</p><p>two</p>",
            |s| DomRange::new(text_at(s, 0, 1), text_at(s, 1, 2)),
            ToolbarCommand::Italic,
        );
        assert_eq!(html, "<p>o<em>ne</em></p><p><em>tw</em>o</p>");
    }

    #[test]
    fn test_bold_toggles_off_inside_b() {
        let html = run(
            "<p>a<b>bold</b>c</p>",
            |s| DomRange::new(text_at(s, 1, 1), text_at(s, 1, 3)),
            ToolbarCommand::Bold,
        );
        assert_eq!(html, "<p>aboldc</p>");
    }

    #[test]
    fn test_inline_collapsed_is_noop() {
        let mut s = Surface::from_html("<p>abc</p>");
        let mut r = DomRange::caret(text_at(&s, 0, 1));
        assert!(!execute_command(&mut s, &mut r, ToolbarCommand::Underline));
        assert_eq!(s.html(), "<p>abc</p>");
    }

    #[test]
    fn test_heading_retags_and_toggles_back() {
        let mut s = Surface::from_html("<p>Title</p>");
        let mut r = DomRange::caret(text_at(&s, 0, 2));
        execute_command(&mut s, &mut r, ToolbarCommand::Heading(HeadingLevel::H2));
        assert_eq!(s.html(), "<h2>Title</h2>");
        execute_command(&mut s, &mut r, ToolbarCommand::Heading(HeadingLevel::H1));
        assert_eq!(s.html(), "<h1>Title</h1>");
        execute_command(&mut s, &mut r, ToolbarCommand::Heading(HeadingLevel::H1));
        assert_eq!(s.html(), "<p>Title</p>");
        assert_eq!(r.focus.offset, 2);
    }

    #[test]
    fn test_heading_wraps_root_line() {
        let html = run(
            "intro<br>second <em>line</em><br>third",
            |s| DomRange::caret(text_at(s, 1, 3)),
            ToolbarCommand::Heading(HeadingLevel::H3),
        );
        insta::assert_snapshot!(html, @"intro<br><h3>second <em>line</em></h3><br>third");
    }

    #[test]
    fn test_heading_on_empty_surface() {
        let mut s = Surface::new();
        let mut r = DomRange::caret(DomPoint::new(s.root(), 0));
        execute_command(&mut s, &mut r, ToolbarCommand::Heading(HeadingLevel::H1));
        assert_eq!(s.html(), "<h1></h1>");
        assert_eq!(s.tag(r.focus.node), Some("h1"));
    }

    #[test]
    fn test_align_merges_style() {
        let html = run(
            r#"<p style="color: red">x</p>"#,
            |s| DomRange::caret(text_at(s, 0, 0)),
            ToolbarCommand::AlignCenter,
        );
        assert_eq!(html, r#"<p style="color: red; text-align: center">x</p>"#);

        let html = run(
            r#"<p style="text-align: left">x</p>"#,
            |s| DomRange::caret(text_at(s, 0, 0)),
            ToolbarCommand::AlignRight,
        );
        assert_eq!(html, r#"<p style="text-align: right">x</p>"#);
    }

    #[test]
    fn test_align_wraps_bare_text() {
        let html = run(
            "loose text",
            |s| DomRange::caret(text_at(s, 0, 3)),
            ToolbarCommand::AlignJustify,
        );
        assert_eq!(html, r#"<div style="text-align: justify">loose text</div>"#);
    }

    #[test]
    fn test_history_commands_are_not_transforms() {
        let mut s = Surface::from_html("<p>x</p>");
        let mut r = DomRange::caret(text_at(&s, 0, 1));
        assert!(!execute_command(&mut s, &mut r, ToolbarCommand::Undo));
        assert!(!execute_command(&mut s, &mut r, ToolbarCommand::Redo));
    }

    #[test]
    fn test_inline_run_bounds() {
        let s = Surface::from_html("a<b>b</b><br>c<p>d</p>e");
        let root = s.root();
        let texts = s.text_nodes(root);
        assert_eq!(inline_run(&s, root, texts[1]).len(), 2);
        assert_eq!(inline_run(&s, root, texts[2]), vec![texts[2]]);
        let p = s.children(root)[4];
        assert_eq!(inline_run(&s, root, texts[3]), vec![p]);
        assert_eq!(inline_run(&s, root, root), Vec::<NodeId>::new());
    }
}
