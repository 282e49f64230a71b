//! HTML fragment parsing into a [`Surface`] and serialization back out.
//!
//! Parsing runs html5ever's fragment algorithm with a `<body>` context, so
//! implied end tags, entity decoding and raw-text elements behave as they do
//! in a browser. The tree builder writes into a small reference-counted DOM
//! ([`FragmentSink`]) which is then copied into the arena.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use html5ever::interface::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::tendril::StrTendril;
use html5ever::tendril::stream::TendrilSink;
use html5ever::{
    Attribute, ExpandedName, LocalName, ParseOpts, QualName, local_name, ns, parse_fragment,
};
use pulldown_cmark_escape::{FmtWriter, escape_html, escape_html_body_text};

use crate::surface::{NodeData, NodeId, Surface};

/// Elements that never have children or an end tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Parse `html` and append the resulting nodes to `parent`.
pub(crate) fn parse_into(surface: &mut Surface, parent: NodeId, html: &str) {
    let context = QualName::new(None, ns!(html), local_name!("body"));
    let document = parse_fragment(
        FragmentSink::default(),
        ParseOpts::default(),
        context,
        Vec::new(),
        false,
    )
    .one(html);

    // Fragment content hangs off a synthetic <html> element.
    for wrapper in document.children.borrow().iter() {
        for child in wrapper.children.borrow().iter() {
            import(surface, parent, child);
        }
    }
}

fn import(surface: &mut Surface, parent: NodeId, node: &Handle) {
    match &node.kind {
        ParsedKind::Text(text) => {
            let text = text.borrow();
            if text.is_empty() {
                return;
            }
            // Text either side of a dropped comment ends up in one node.
            let previous = surface.children(parent).last().copied();
            let merged = previous
                .and_then(|prev| surface.text(prev).map(|t| (prev, format!("{t}{}", &text[..]))));
            match merged {
                Some((prev, merged)) => surface.set_text(prev, merged),
                None => {
                    let id = surface.create_text(&text[..]);
                    surface.append_child(parent, id);
                }
            }
        }
        ParsedKind::Element { attrs, .. } => {
            let id = surface.create_element(&*node.name.local);
            for attr in attrs.borrow().iter() {
                surface.set_attr(id, &attr.name.local, &attr.value[..]);
            }
            surface.append_child(parent, id);
            for child in node.children.borrow().iter() {
                import(surface, id, child);
            }
        }
        ParsedKind::Container | ParsedKind::Ignored => {}
    }
}

type Handle = Rc<ParsedNode>;

struct ParsedNode {
    /// Element name; empty for every other kind.
    name: QualName,
    kind: ParsedKind,
    parent: RefCell<Option<Weak<ParsedNode>>>,
    children: RefCell<Vec<Handle>>,
}

enum ParsedKind {
    /// The document, or a template's contents.
    Container,
    Element {
        attrs: RefCell<Vec<Attribute>>,
        template: Option<Handle>,
    },
    Text(RefCell<StrTendril>),
    /// Comments and processing instructions.
    Ignored,
}

impl ParsedNode {
    fn new(name: QualName, kind: ParsedKind) -> Handle {
        Rc::new(Self {
            name,
            kind,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    fn unnamed(kind: ParsedKind) -> Handle {
        Self::new(QualName::new(None, ns!(), LocalName::from("")), kind)
    }

    fn text(text: StrTendril) -> Handle {
        Self::unnamed(ParsedKind::Text(RefCell::new(text)))
    }

    /// Append to this node if it is text. Adjacent text is always merged.
    fn push_text(&self, text: &str) -> bool {
        match &self.kind {
            ParsedKind::Text(contents) => {
                contents.borrow_mut().push_slice(text);
                true
            }
            _ => false,
        }
    }
}

fn attach(parent: &Handle, child: Handle) {
    *child.parent.borrow_mut() = Some(Rc::downgrade(parent));
    parent.children.borrow_mut().push(child);
}

fn parent_and_index(node: &Handle) -> Option<(Handle, usize)> {
    let parent = node.parent.borrow().as_ref()?.upgrade()?;
    let index = parent
        .children
        .borrow()
        .iter()
        .position(|child| Rc::ptr_eq(child, node))?;
    Some((parent, index))
}

fn detach(node: &Handle) {
    if let Some((parent, index)) = parent_and_index(node) {
        parent.children.borrow_mut().remove(index);
    }
    *node.parent.borrow_mut() = None;
}

/// Tree builder target for one fragment parse.
struct FragmentSink {
    document: Handle,
}

impl Default for FragmentSink {
    fn default() -> Self {
        Self {
            document: ParsedNode::unnamed(ParsedKind::Container),
        }
    }
}

impl TreeSink for FragmentSink {
    type Handle = Handle;
    type Output = Handle;
    type ElemName<'a> = ExpandedName<'a>;

    fn finish(self) -> Handle {
        self.document
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        tracing::trace!(target: "copydesk::html", %msg, "recovered from malformed html");
    }

    fn get_document(&self) -> Handle {
        self.document.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Handle) -> ExpandedName<'a> {
        target.name.expanded()
    }

    fn create_element(&self, name: QualName, attrs: Vec<Attribute>, flags: ElementFlags) -> Handle {
        let template = flags
            .template
            .then(|| ParsedNode::unnamed(ParsedKind::Container));
        ParsedNode::new(
            name,
            ParsedKind::Element {
                attrs: RefCell::new(attrs),
                template,
            },
        )
    }

    fn create_comment(&self, _text: StrTendril) -> Handle {
        ParsedNode::unnamed(ParsedKind::Ignored)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Handle {
        ParsedNode::unnamed(ParsedKind::Ignored)
    }

    fn append(&self, parent: &Handle, child: NodeOrText<Handle>) {
        match child {
            NodeOrText::AppendText(text) => {
                if let Some(last) = parent.children.borrow().last() {
                    if last.push_text(&text) {
                        return;
                    }
                }
                attach(parent, ParsedNode::text(text));
            }
            NodeOrText::AppendNode(node) => attach(parent, node),
        }
    }

    fn append_before_sibling(&self, sibling: &Handle, child: NodeOrText<Handle>) {
        let node = match child {
            NodeOrText::AppendText(text) => {
                if let Some((parent, index)) = parent_and_index(sibling) {
                    if index > 0 && parent.children.borrow()[index - 1].push_text(&text) {
                        return;
                    }
                }
                ParsedNode::text(text)
            }
            NodeOrText::AppendNode(node) => {
                detach(&node);
                node
            }
        };
        let Some((parent, index)) = parent_and_index(sibling) else {
            return;
        };
        *node.parent.borrow_mut() = Some(Rc::downgrade(&parent));
        parent.children.borrow_mut().insert(index, node);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Handle,
        prev_element: &Handle,
        child: NodeOrText<Handle>,
    ) {
        if parent_and_index(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(&self, _name: StrTendril, _public: StrTendril, _system: StrTendril) {}

    fn get_template_contents(&self, target: &Handle) -> Handle {
        match &target.kind {
            ParsedKind::Element {
                template: Some(contents),
                ..
            } => contents.clone(),
            _ => target.clone(),
        }
    }

    fn same_node(&self, x: &Handle, y: &Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn add_attrs_if_missing(&self, target: &Handle, attrs: Vec<Attribute>) {
        if let ParsedKind::Element { attrs: existing, .. } = &target.kind {
            let mut existing = existing.borrow_mut();
            for attr in attrs {
                if !existing.iter().any(|e| e.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Handle) {
        detach(target);
    }

    fn reparent_children(&self, node: &Handle, new_parent: &Handle) {
        let children = std::mem::take(&mut *node.children.borrow_mut());
        for child in children {
            attach(new_parent, child);
        }
    }
}

/// Serialized children of a node, written on demand.
pub(crate) struct InnerHtml<'a> {
    pub surface: &'a Surface,
    pub id: NodeId,
}

impl fmt::Display for InnerHtml<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_children(self.surface, self.id, f)
    }
}

fn write_children<W: fmt::Write>(surface: &Surface, id: NodeId, out: &mut W) -> fmt::Result {
    for &child in surface.children(id) {
        write_node(surface, child, out)?;
    }
    Ok(())
}

fn write_node<W: fmt::Write>(surface: &Surface, id: NodeId, out: &mut W) -> fmt::Result {
    match surface.data(id) {
        Some(NodeData::Text(text)) => escape_html_body_text(FmtWriter(&mut *out), text)?,
        Some(NodeData::Element(el)) => {
            write!(out, "<{}", el.tag)?;
            for (name, value) in &el.attrs {
                write!(out, " {name}=\"")?;
                escape_html(FmtWriter(&mut *out), value)?;
                out.write_char('"')?;
            }
            out.write_char('>')?;
            if is_void(&el.tag) {
                return Ok(());
            }
            write_children(surface, id, out)?;
            write!(out, "</{}>", el.tag)?;
        }
        None => {}
    }
    Ok(())
}
