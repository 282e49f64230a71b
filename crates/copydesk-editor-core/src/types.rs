//! Core editor types: boundary points, live ranges, serialized selections,
//! editor mode and host notices.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::surface::{NodeId, Surface};

/// A boundary point in the surface.
///
/// For text nodes `offset` counts chars; for elements it is a child index.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct DomPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl DomPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Sort key: the node's path from `root` with the offset appended.
    /// Lexicographic order on keys is document order on points.
    fn order_key(&self, surface: &Surface, root: NodeId) -> Option<Vec<usize>> {
        let mut key = crate::selection::path_to(surface, root, self.node)?;
        key.push(self.offset);
        Some(key)
    }
}

/// Compare two points in document order. `None` if either is outside `root`.
pub fn compare_points(
    surface: &Surface,
    root: NodeId,
    a: &DomPoint,
    b: &DomPoint,
) -> Option<Ordering> {
    Some(a.order_key(surface, root)?.cmp(&b.order_key(surface, root)?))
}

/// A live selection. The anchor is where it started, the focus is where the
/// caret is now; they may be in either order.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub anchor: DomPoint,
    pub focus: DomPoint,
}

impl DomRange {
    pub fn new(anchor: DomPoint, focus: DomPoint) -> Self {
        Self { anchor, focus }
    }

    /// A collapsed range (caret).
    pub fn caret(point: DomPoint) -> Self {
        Self {
            anchor: point,
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// `(start, end)` in document order.
    pub fn ordered(&self, surface: &Surface, root: NodeId) -> (DomPoint, DomPoint) {
        match compare_points(surface, root, &self.anchor, &self.focus) {
            Some(Ordering::Greater) => (self.focus, self.anchor),
            _ => (self.anchor, self.focus),
        }
    }

    /// Whether both endpoints still lie inside `root`.
    pub fn is_within(&self, surface: &Surface, root: NodeId) -> bool {
        surface.contains(root, self.anchor.node) && surface.contains(root, self.focus.node)
    }

    /// Point any endpoint that referenced `old` at `new` instead.
    pub fn remap(&mut self, old: NodeId, new: NodeId) {
        for point in [&mut self.anchor, &mut self.focus] {
            if point.node == old {
                point.node = new;
            }
        }
    }
}

/// Structural snapshot of a selection: child-index paths from the root plus
/// offsets. Meaningful only against the tree shape it was captured from.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub anchor_path: Vec<usize>,
    pub anchor_offset: usize,
    pub focus_path: Vec<usize>,
    pub focus_offset: usize,
}

/// Editor display mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// Normal mode: the host's content string is authoritative.
    #[default]
    Closed,
    /// Fullscreen rich editing: the surface is authoritative.
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient message for the host to show (toast).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: SmolStr,
}

impl Notice {
    pub fn success(message: impl Into<SmolStr>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<SmolStr>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}
