//! A small arena DOM for the HTML subset the writer understands.
//!
//! Markup goes through kuchiki's HTML5 parser, so implied end tags, void
//! elements, entities and the `html`/`head`/`body` scaffolding follow the
//! browser rules. The parsed tree is then flattened into an arena where
//! every node gets a stable [`NodeId`] equal to its index, assigned in
//! document order. Comments and doctypes are dropped.

use kuchiki::traits::TendrilSink;
use kuchiki::NodeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Depth-first traversal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Enter(NodeId),
    Exit(NodeId),
}

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody",
    "td", "tfoot", "th", "thead", "tr", "ul",
];

pub fn is_block_element(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    pub fn parse(source: &str) -> Self {
        let document = kuchiki::parse_html().one(source);
        let mut tree = DomTree {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        };
        let root = tree.root();
        tree.append_children(&document, root);
        log::debug!("parsed {} html nodes", tree.len());
        tree
    }

    fn append_children(&mut self, source: &NodeRef, parent: NodeId) {
        for child in source.children() {
            if let Some(element) = child.as_element() {
                let attrs = element
                    .attributes
                    .borrow()
                    .map
                    .iter()
                    .map(|(name, attr)| (name.local.to_string(), attr.value.clone()))
                    .collect();
                let name = element.name.local.to_string();
                let id = self.push(parent, NodeData::Element { name, attrs });
                self.append_children(&child, id);
            } else if let Some(text) = child.as_text() {
                self.push(parent, NodeData::Text(text.borrow().clone()));
            }
        }
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text(_))
    }

    pub fn is_block_level(&self, id: NodeId) -> bool {
        self.tag_name(id).is_some_and(is_block_element)
    }

    /// Concatenated descendant text with whitespace collapsed.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut raw = String::new();
        for step in self.traverse_from(id) {
            if let Walk::Enter(node) = step {
                if let Some(text) = self.text(node) {
                    raw.push_str(text);
                    raw.push(' ');
                }
            }
        }
        collapse_whitespace(&raw).trim().to_string()
    }

    /// First element named `tag` in document order.
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .find(|id| self.tag_name(*id) == Some(tag))
    }

    pub fn traverse(&self) -> Traverse<'_> {
        self.traverse_from(self.root())
    }

    pub fn traverse_from(&self, id: NodeId) -> Traverse<'_> {
        Traverse {
            tree: self,
            stack: vec![(id, false)],
        }
    }
}

/// Pre/post-order walk yielding [`Walk::Enter`] and [`Walk::Exit`] for
/// every node under (and including) the starting node.
pub struct Traverse<'a> {
    tree: &'a DomTree,
    stack: Vec<(NodeId, bool)>,
}

impl Iterator for Traverse<'_> {
    type Item = Walk;

    fn next(&mut self) -> Option<Walk> {
        let (id, entered) = self.stack.pop()?;
        if entered {
            return Some(Walk::Exit(id));
        }
        self.stack.push((id, true));
        for child in self.tree.children(id).iter().rev() {
            self.stack.push((*child, false));
        }
        Some(Walk::Enter(id))
    }
}

/// Collapse every whitespace run into a single space.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() && ch != '\u{a0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}
