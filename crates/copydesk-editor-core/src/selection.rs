//! Selection serialization as child-index paths.
//!
//! Commands and re-renders replace nodes, so a node handle captured before a
//! mutation may not mean much afterwards. A path from the root usually still
//! does, because edits are local. Restoring is best-effort: a path that no
//! longer fits the tree is reported as an error value for the caller to log.

use crate::error::SelectionError;
use crate::surface::{NodeId, Surface};
use crate::types::{DomPoint, DomRange, SelectionRecord};

/// Child indices leading from `root` down to `node`.
///
/// `None` if walking up from `node` runs out of parents before reaching
/// `root`; no partial path is ever returned.
pub fn path_to(surface: &Surface, root: NodeId, node: NodeId) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    let mut current = node;
    while current != root {
        path.push(surface.index_in_parent(current)?);
        current = surface.parent(current)?;
    }
    path.reverse();
    Some(path)
}

/// Serialize `selection` relative to `root`.
///
/// Returns `None` when there is no selection or either endpoint lies outside
/// `root`.
pub fn capture(
    surface: &Surface,
    root: NodeId,
    selection: Option<&DomRange>,
) -> Option<SelectionRecord> {
    let range = selection?;
    if !surface.contains(root, range.anchor.node) {
        return None;
    }
    let record = SelectionRecord {
        anchor_path: path_to(surface, root, range.anchor.node)?,
        anchor_offset: range.anchor.offset,
        focus_path: path_to(surface, root, range.focus.node)?,
        focus_offset: range.focus.offset,
    };
    tracing::trace!(target: "copydesk::selection", ?record, "captured selection");
    Some(record)
}

/// Walk `path` down from `root`.
pub fn resolve_path(
    surface: &Surface,
    root: NodeId,
    path: &[usize],
) -> Result<NodeId, SelectionError> {
    if !surface.contains_node(root) {
        return Err(SelectionError::Detached);
    }
    let mut current = root;
    for (depth, &index) in path.iter().enumerate() {
        let children = surface.children(current);
        current = *children.get(index).ok_or(SelectionError::PathOutOfRange {
            depth,
            index,
            len: children.len(),
        })?;
    }
    Ok(current)
}

/// Re-establish a selection from a record against the current tree.
///
/// Both endpoints must resolve or nothing is restored. Offsets are clamped to
/// the resolved node's length so text that shrank since capture is tolerated.
pub fn restore(
    surface: &Surface,
    root: NodeId,
    record: &SelectionRecord,
) -> Result<DomRange, SelectionError> {
    let anchor = resolve_point(surface, root, &record.anchor_path, record.anchor_offset)?;
    let focus = resolve_point(surface, root, &record.focus_path, record.focus_offset)?;
    Ok(DomRange::new(anchor, focus))
}

fn resolve_point(
    surface: &Surface,
    root: NodeId,
    path: &[usize],
    offset: usize,
) -> Result<DomPoint, SelectionError> {
    let node = resolve_path(surface, root, path)?;
    let clamped = offset.min(surface.node_len(node));
    if clamped != offset {
        tracing::trace!(
            target: "copydesk::selection",
            offset,
            clamped,
            "clamped restored offset"
        );
    }
    Ok(DomPoint::new(node, clamped))
}

/// The position just past the last text in `root`, or the end of `root`
/// itself when it has no text.
pub fn end_point(surface: &Surface, root: NodeId) -> DomPoint {
    match surface.text_nodes(root).last() {
        Some(&text) => DomPoint::new(text, surface.node_len(text)),
        None => DomPoint::new(root, surface.children(root).len()),
    }
}

/// The point `offset` chars into the concatenated text beneath `root`.
///
/// An offset on the boundary between two text nodes resolves to the end of
/// the earlier one. Offsets past the end resolve to [`end_point`].
pub fn point_at_char(surface: &Surface, root: NodeId, offset: usize) -> DomPoint {
    let mut remaining = offset;
    for text in surface.text_nodes(root) {
        let len = surface.node_len(text);
        if remaining <= len {
            return DomPoint::new(text, remaining);
        }
        remaining -= len;
    }
    end_point(surface, root)
}
