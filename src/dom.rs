//! Document tree
//!
//! [`Document`] wraps a `scraper::Html`: html5ever's parse output stored in
//! an `ego_tree` arena. Extraction relies on two properties of that arena.
//! `Clone` is a plain structural copy, so Layer 3 can edit a clone while the
//! original survives for the other layers. A [`NodeId`] taken from one
//! document also addresses the same node in any clone of it.
//!
//! Detaching a node unlinks it from its parent; the node stays in the arena
//! but is no longer reachable from the root. All traversals here start from a
//! reachable node and therefore never observe detached subtrees. Comments,
//! doctypes and processing instructions are present in the tree but surface
//! as [`NodeKind::Other`] and carry no text.
//!
//! Every walk uses an explicit stack or an `ego_tree` iterator, so deeply
//! nested markup never grows the call stack.

pub use ego_tree::NodeId;

use scraper::node::Element;
use scraper::{ElementRef, Html, Node};

/// Element names that never carry document text
const NON_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Void elements, serialized without a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Borrowed view of a node
#[derive(Debug, Clone, Copy)]
pub enum NodeKind<'a> {
    Document,
    Element(&'a Element),
    Text(&'a str),
    /// Comment, doctype or processing instruction
    Other,
}

/// Parsed page
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl From<Html> for Document {
    fn from(html: Html) -> Self {
        Self { html }
    }
}

impl Document {
    pub fn root(&self) -> NodeId {
        self.html.tree.root().id()
    }

    pub fn kind(&self, id: NodeId) -> NodeKind<'_> {
        let Some(node) = self.html.tree.get(id) else {
            return NodeKind::Other;
        };
        match node.value() {
            Node::Document | Node::Fragment => NodeKind::Document,
            Node::Element(el) => NodeKind::Element(el),
            Node::Text(text) => NodeKind::Text(&text.text),
            _ => NodeKind::Other,
        }
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.html.tree.get(id)?.value().as_element()
    }

    /// Element handle for selector matching
    pub(crate) fn element_ref(&self, id: NodeId) -> Option<ElementRef<'_>> {
        ElementRef::wrap(self.html.tree.get(id)?)
    }

    /// Lowercase local tag name
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::name)
    }

    pub fn is_element(&self, id: NodeId, name: &str) -> bool {
        self.tag_name(id) == Some(name)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.html.tree.get(id)?.parent().map(|parent| parent.id())
    }

    /// Children of `id`, in order
    pub fn children(&self, id: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.html
            .tree
            .get(id)
            .into_iter()
            .flat_map(|node| node.children())
            .map(|child| child.id())
    }

    /// Element children of `id`, in order
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .filter(move |child| self.element(*child).is_some())
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.html
            .tree
            .get(id)
            .into_iter()
            .flat_map(|node| node.ancestors())
            .map(|ancestor| ancestor.id())
    }

    /// Pre-order traversal of the subtree rooted at `id`, including `id`
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.html
            .tree
            .get(id)
            .into_iter()
            .flat_map(|node| node.descendants())
            .map(|node| node.id())
    }

    /// Every reachable element, in document order
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(self.root())
            .filter(move |id| self.element(*id).is_some())
    }

    /// First reachable element with the given tag name, depth-first
    pub fn find_element(&self, name: &str) -> Option<NodeId> {
        self.elements().find(|id| self.is_element(*id, name))
    }

    /// True when `id` is still connected to the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root() || self.ancestors(id).last() == Some(self.root())
    }

    /// Unlink the subtree rooted at `id` from its parent
    ///
    /// Detaching the root or an already-detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// True for elements whose text never counts as content
    pub fn is_non_text_element(&self, id: NodeId) -> bool {
        self.tag_name(id)
            .is_some_and(|name| NON_TEXT_ELEMENTS.contains(&name))
    }

    /// Concatenated text of the subtree, skipping script-like elements
    pub fn text_content(&self, id: NodeId) -> String {
        let mut output = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.kind(current) {
                NodeKind::Text(text) => output.push_str(text),
                NodeKind::Other => {}
                NodeKind::Element(_) if self.is_non_text_element(current) => {}
                NodeKind::Element(_) | NodeKind::Document => {
                    stack.extend(self.children(current).rev());
                }
            }
        }
        output
    }

    /// Serialize the subtree rooted at `id` back to HTML
    ///
    /// Identical input always serializes to identical output. Only elements
    /// and text are written.
    pub fn outer_html(&self, id: NodeId) -> String {
        enum Frame<'a> {
            Enter(NodeId),
            Close(&'a str),
        }

        let mut output = String::new();
        let mut stack = vec![Frame::Enter(id)];
        while let Some(frame) = stack.pop() {
            let current = match frame {
                Frame::Close(name) => {
                    output.push_str("</");
                    output.push_str(name);
                    output.push('>');
                    continue;
                }
                Frame::Enter(current) => current,
            };

            match self.kind(current) {
                NodeKind::Text(text) => escape_text(text, &mut output),
                NodeKind::Other => {}
                NodeKind::Document => stack.extend(self.children(current).rev().map(Frame::Enter)),
                NodeKind::Element(el) => {
                    output.push('<');
                    output.push_str(el.name());
                    for (name, value) in el.attrs() {
                        output.push(' ');
                        output.push_str(name);
                        output.push_str("=\"");
                        escape_attr(value, &mut output);
                        output.push('"');
                    }
                    output.push('>');
                    if VOID_ELEMENTS.contains(&el.name()) {
                        continue;
                    }
                    stack.push(Frame::Close(el.name()));
                    stack.extend(self.children(current).rev().map(Frame::Enter));
                }
            }
        }
        output
    }
}

fn escape_text(text: &str, output: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(ch),
        }
    }
}

fn escape_attr(value: &str, output: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(ch),
        }
    }
}
