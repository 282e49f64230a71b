//! The editable surface: an owned node tree standing in for the live DOM.
//!
//! Nodes live in a slot arena and refer to each other by [`NodeId`]. Ids stay
//! valid for as long as the node is in the arena, so moving a text node into a
//! new wrapper does not invalidate a selection that points at it. Removing a
//! subtree frees its ids; stale ids simply stop resolving.

use slotmap::{SlotMap, new_key_type};
use smol_str::SmolStr;

new_key_type! {
    /// Stable handle to a node in a [`Surface`].
    pub struct NodeId;
}

/// Element payload: lowercase tag name plus attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: SmolStr,
    pub attrs: Vec<(SmolStr, String)>,
}

impl Element {
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Tags treated as block boundaries by commands and the text projections.
pub const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "blockquote",
    "pre",
];

pub fn is_heading_tag(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// Arena-backed document tree with a `div` root.
#[derive(Debug, Clone)]
pub struct Surface {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element(Element::new("div")),
        });
        Self { nodes, root }
    }

    /// Build a surface whose root holds the parsed fragment.
    pub fn from_html(html: &str) -> Self {
        let mut surface = Self::new();
        surface.set_inner_html(html);
        surface
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id).map(|n| &n.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id)? {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(t) => Some(t.as_str()),
            NodeData::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let index = self.index_in_parent(id)?;
        let parent = self.parent(id)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let index = self.index_in_parent(id)?;
        let parent = self.parent(id)?;
        self.child(parent, index + 1)
    }

    /// Boundary length of a node: chars for text, child count for elements.
    pub fn node_len(&self, id: NodeId) -> usize {
        match self.data(id) {
            Some(NodeData::Text(t)) => t.chars().count(),
            Some(NodeData::Element(_)) => self.children(id).len(),
            None => 0,
        }
    }

    /// True if `node` is `ancestor` or lies beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Nearest node (starting at `id` itself) satisfying `pred`, not climbing
    /// past `limit`. `limit` itself is never returned.
    pub fn closest(
        &self,
        id: NodeId,
        limit: NodeId,
        mut pred: impl FnMut(&Self, NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == limit {
                return None;
            }
            if pred(self, node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Nearest element whose tag is in `tags`, bounded by `limit`.
    pub fn closest_tag(&self, id: NodeId, limit: NodeId, tags: &[&str]) -> Option<NodeId> {
        self.closest(id, limit, |s, n| s.tag(n).is_some_and(|t| tags.contains(&t)))
    }

    // === Construction ===

    pub fn create_element(&mut self, tag: impl Into<SmolStr>) -> NodeId {
        self.create(NodeData::Element(Element::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeData::Text(text.into()))
    }

    fn create(&mut self, data: NodeData) -> NodeId {
        self.nodes.insert(Node {
            parent: None,
            children: Vec::new(),
            data,
        })
    }

    // === Mutation ===

    /// Detach `child` from wherever it is and append it to `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Detach `child` and insert it at `index` among `parent`'s children.
    /// The index is clamped to the child count.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if !self.nodes.contains_key(parent) || self.contains(child, parent) {
            return;
        }
        let mut index = index;
        if self.parent(child) == Some(parent) {
            if let Some(old) = self.index_in_parent(child) {
                if old < index {
                    index -= 1;
                }
            }
        }
        self.detach(child);
        let Some(node) = self.nodes.get_mut(child) else {
            return;
        };
        node.parent = Some(parent);
        if let Some(p) = self.nodes.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, child);
        }
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference))
        {
            self.insert_child(parent, index, node);
        }
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference))
        {
            self.insert_child(parent, index + 1, node);
        }
    }

    /// Unlink a node from its parent, keeping it (and its subtree) in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
    }

    /// Detach and free a node and its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            self.clear_children(id);
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(n) = self.nodes.remove(node) {
                stack.extend(n.children);
            }
        }
    }

    pub fn clear_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.remove(child);
        }
    }

    /// Move every child of `from` to the end of `to`, preserving order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children: Vec<NodeId> = self.children(from).to_vec();
        for child in children {
            self.append_child(to, child);
        }
    }

    /// Replace `old` with `new` in its parent. `old` stays in the arena, detached.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) {
        let (Some(parent), Some(index)) = (self.parent(old), self.index_in_parent(old)) else {
            return;
        };
        self.detach(old);
        self.insert_child(parent, index, new);
    }

    /// Replace an element with its children.
    pub fn unwrap_node(&mut self, id: NodeId) {
        let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) else {
            return;
        };
        let children: Vec<NodeId> = self.children(id).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            self.insert_child(parent, index + 1 + offset, child);
        }
        self.remove(id);
    }

    /// Wrap `id` in a new element with the given tag, returning the wrapper.
    pub fn wrap_node(&mut self, id: NodeId, tag: &str) -> NodeId {
        let wrapper = self.create_element(tag);
        self.replace_node(id, wrapper);
        self.append_child(wrapper, id);
        wrapper
    }

    /// Swap an element for a new one with `tag`, moving attributes and
    /// children over. Returns the new element's id; the old id is freed.
    pub fn retag(&mut self, id: NodeId, tag: &str) -> NodeId {
        let attrs = self.element(id).map(|el| el.attrs.clone()).unwrap_or_default();
        let new = self.create_element(tag);
        if let Some(NodeData::Element(el)) = self.nodes.get_mut(new).map(|n| &mut n.data) {
            el.attrs = attrs;
        }
        self.move_children(id, new);
        self.replace_node(id, new);
        self.remove(id);
        new
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Some(NodeData::Text(t)) = self.nodes.get_mut(id).map(|n| &mut n.data) {
            *t = text.into();
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(NodeData::Element(el)) = self.nodes.get_mut(id).map(|n| &mut n.data) {
            match el.attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value,
                None => el.attrs.push((SmolStr::new(name), value)),
            }
        }
    }

    /// Split a text node at a char offset. The original node keeps the left
    /// half; the right half becomes a new sibling, which is returned.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text(id)?;
        let byte = char_to_byte(text, offset);
        let right = text[byte..].to_string();
        let left = text[..byte].to_string();
        self.set_text(id, left);
        let new = self.create_text(right);
        self.insert_after(id, new);
        Some(new)
    }

    // === Traversal ===

    /// All nodes beneath `id` (excluding `id`) in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_text(n))
            .collect()
    }

    /// Concatenated text of every text node beneath `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.text_nodes(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    // === HTML ===

    /// Replace the root's content with a parsed fragment.
    pub fn set_inner_html(&mut self, html: &str) {
        let root = self.root;
        self.clear_children(root);
        crate::html::parse_into(self, root, html);
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        crate::html::InnerHtml { surface: self, id }.to_string()
    }

    /// Serialized content of the whole surface.
    pub fn html(&self) -> String {
        self.inner_html(self.root)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Byte index of the `offset`-th char, clamped to the string length.
pub(crate) fn char_to_byte(s: &str, offset: usize) -> usize {
    s.char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
