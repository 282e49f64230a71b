//! List commands: toggling, the list repair step, indent and outdent.
//!
//! List toggling runs in two steps. The structural step handles the cases
//! with an obvious answer (caret already in a list, or in a paragraph). The
//! repair step then checks whether the caret ended up in a list item and, if
//! not, moves the caret's block wholesale into a fresh single-item list.

use smol_str::SmolStr;

use crate::execute::{TEXT_BLOCKS, point_node, wrap_inline_run};
use crate::selection::end_point;
use crate::surface::{NodeId, Surface};
use crate::types::DomRange;

/// What the structural step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListOutcome {
    /// An item of the same kind was lifted out into a paragraph.
    Lifted,
    /// The enclosing list was switched to the other kind.
    Converted,
    /// A paragraph became a list.
    Created,
    /// Nothing matched; left to the repair step.
    Unhandled,
}

/// Toggle a `kind` list (`ul` or `ol`) at the caret.
pub(crate) fn apply_list(surface: &mut Surface, range: &mut DomRange, kind: &str) -> bool {
    let outcome = toggle_list(surface, range, kind);
    tracing::trace!(target: "copydesk::command", ?outcome, kind, "list step");
    // Toggling a list off leaves the caret outside any item on purpose.
    let repaired = outcome != ListOutcome::Lifted && repair_list(surface, range, kind);
    outcome != ListOutcome::Unhandled || repaired
}

pub(crate) fn toggle_list(surface: &mut Surface, range: &mut DomRange, kind: &str) -> ListOutcome {
    let root = surface.root();
    let node = point_node(surface, &range.focus);

    if let Some(item) = surface.closest_tag(node, root, &["li"]) {
        let Some(list) = surface.parent(item) else {
            return ListOutcome::Unhandled;
        };
        if surface.is_element(list, kind) {
            if let Some(paragraph) = lift_item(surface, item) {
                range.remap(item, paragraph);
            }
            return ListOutcome::Lifted;
        }
        let new = surface.retag(list, kind);
        range.remap(list, new);
        return ListOutcome::Converted;
    }

    if let Some(block) = surface.closest_tag(node, root, &["p", "div"]) {
        block_to_list(surface, block, kind);
        return ListOutcome::Created;
    }
    ListOutcome::Unhandled
}

/// Make sure the caret ends up in a list item after a list command.
///
/// Returns true if the tree had to be repaired.
pub(crate) fn repair_list(surface: &mut Surface, range: &mut DomRange, kind: &str) -> bool {
    let root = surface.root();
    if !range.is_within(surface, root) {
        *range = DomRange::caret(end_point(surface, root));
    }
    let node = point_node(surface, &range.focus);
    if surface.closest_tag(node, root, &["li"]).is_some() {
        return false;
    }

    let block = surface.closest_tag(node, root, TEXT_BLOCKS);
    let list = surface.create_element(kind);
    let item = surface.create_element("li");
    surface.append_child(list, item);

    match block {
        Some(block) => {
            surface.move_children(block, item);
            surface.replace_node(block, list);
            surface.remove(block);
        }
        None => {
            surface.move_children(root, item);
            surface.append_child(root, list);
        }
    }

    *range = DomRange::caret(end_point(surface, item));
    tracing::debug!(target: "copydesk::command", kind, "synthesized list around caret");
    true
}

/// Turn a paragraph into a list with one item per `br`-separated line.
fn block_to_list(surface: &mut Surface, block: NodeId, kind: &str) -> NodeId {
    let list = surface.create_element(kind);
    let mut item: Option<NodeId> = None;
    for child in surface.children(block).to_vec() {
        if surface.is_element(child, "br") {
            item = None;
            surface.remove(child);
            continue;
        }
        let li = match item {
            Some(li) => li,
            None => {
                let li = surface.create_element("li");
                surface.append_child(list, li);
                item = Some(li);
                li
            }
        };
        surface.append_child(li, child);
    }
    if surface.children(list).is_empty() {
        let li = surface.create_element("li");
        surface.append_child(list, li);
    }
    surface.replace_node(block, list);
    surface.remove(block);
    list
}

/// Move a list item out of its list as a paragraph, splitting the list
/// around it. Returns the new paragraph.
pub(crate) fn lift_item(surface: &mut Surface, item: NodeId) -> Option<NodeId> {
    let list = surface.parent(item)?;
    let kind = SmolStr::new(surface.tag(list)?);
    let index = surface.index_in_parent(item)?;

    let following = surface.children(list)[index + 1..].to_vec();
    if !following.is_empty() {
        let tail = surface.create_element(kind);
        surface.insert_after(list, tail);
        for id in following {
            surface.append_child(tail, id);
        }
    }

    let paragraph = surface.retag(item, "p");
    surface.insert_after(list, paragraph);
    if surface.children(list).is_empty() {
        surface.remove(list);
    }
    Some(paragraph)
}

/// Increase nesting at the caret.
pub(crate) fn indent(surface: &mut Surface, range: &mut DomRange) -> bool {
    let root = surface.root();
    let node = point_node(surface, &range.focus);

    if let Some(item) = surface.closest_tag(node, root, &["li"]) {
        return indent_item(surface, item);
    }

    let block = match surface.closest_tag(node, root, TEXT_BLOCKS) {
        Some(block) => block,
        None => {
            let container = surface
                .closest_tag(node, root, &["blockquote"])
                .unwrap_or(root);
            wrap_inline_run(surface, container, node, "p")
        }
    };
    surface.wrap_node(block, "blockquote");
    true
}

/// Nest an item under its previous sibling. The first item of a list has
/// nothing to nest under and stays put.
fn indent_item(surface: &mut Surface, item: NodeId) -> bool {
    let Some(list) = surface.parent(item) else {
        return false;
    };
    let Some(previous) = surface
        .previous_sibling(item)
        .filter(|&prev| surface.is_element(prev, "li"))
    else {
        return false;
    };
    let Some(kind) = surface.tag(list).map(SmolStr::new) else {
        return false;
    };

    let nested = match surface
        .children(previous)
        .last()
        .copied()
        .filter(|&last| surface.is_element(last, &kind))
    {
        Some(nested) => nested,
        None => {
            let nested = surface.create_element(kind);
            surface.append_child(previous, nested);
            nested
        }
    };
    surface.append_child(nested, item);
    true
}

/// Decrease nesting at the caret.
pub(crate) fn outdent(surface: &mut Surface, range: &mut DomRange) -> bool {
    let root = surface.root();
    let node = point_node(surface, &range.focus);

    if let Some(item) = surface.closest_tag(node, root, &["li"]) {
        let Some(list) = surface.parent(item) else {
            return false;
        };
        return match surface.parent(list).filter(|&p| surface.is_element(p, "li")) {
            Some(outer) => {
                outdent_nested(surface, item, list, outer);
                true
            }
            None => match lift_item(surface, item) {
                Some(paragraph) => {
                    range.remap(item, paragraph);
                    true
                }
                None => false,
            },
        };
    }

    match surface.closest_tag(node, root, &["blockquote"]) {
        Some(quote) => {
            surface.unwrap_node(quote);
            true
        }
        None => false,
    }
}

/// Move a nested item up one level, after the item that contained it. Its
/// following siblings stay below it as its own sublist.
fn outdent_nested(surface: &mut Surface, item: NodeId, list: NodeId, outer: NodeId) {
    let Some(index) = surface.index_in_parent(item) else {
        return;
    };
    let following = surface.children(list)[index + 1..].to_vec();
    let kind = surface.tag(list).map(SmolStr::new);
    if let (false, Some(kind)) = (following.is_empty(), kind) {
        let sublist = surface.create_element(kind);
        surface.append_child(item, sublist);
        for id in following {
            surface.append_child(sublist, id);
        }
    }
    surface.insert_after(outer, item);
    if surface.children(list).is_empty() {
        surface.remove(list);
    }
}
