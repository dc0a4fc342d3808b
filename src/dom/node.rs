//! In-memory UI tree nodes.
//!
//! A [`NodeRef`] is a cheap, clonable handle (`Rc`) to a node. Children are
//! owned by their parent; parents are referenced weakly, so dropping the last
//! handle to a root frees the whole subtree.

use crate::error::DomError;
use crate::selector::Selector;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Elements that never have children or a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Callback attached to a node for a named UI event.
pub type Listener = Rc<dyn Fn(&UiEvent)>;

/// The event handed to listeners when a node dispatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiEvent {
    pub name: String,
    /// The `value` attribute of the dispatching node, if it has one.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A detached container whose children are moved on append.
    Fragment,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

struct NodeData {
    kind: NodeKind,
    children: Vec<NodeRef>,
    parent: Weak<RefCell<NodeData>>,
    listeners: Vec<(String, Listener)>,
}

/// Shared handle to a node of the in-memory tree.
#[derive(Clone)]
pub struct NodeRef(Rc<RefCell<NodeData>>);

impl NodeRef {
    fn with_kind(kind: NodeKind) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            kind,
            children: Vec::new(),
            parent: Weak::new(),
            listeners: Vec::new(),
        })))
    }

    pub fn fragment() -> Self {
        Self::with_kind(NodeKind::Fragment)
    }

    pub fn element(tag: &str) -> Self {
        Self::with_kind(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text(content.into()))
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Comment(content.into()))
    }

    pub fn kind(&self) -> NodeKind {
        self.0.borrow().kind.clone()
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Element { .. })
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Fragment)
    }

    /// Tag name for elements, `None` for every other node kind.
    pub fn tag(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
            _ => None,
        }
    }

    /// Sets (or replaces) an attribute. A no-op on non-element nodes.
    pub fn set_attr(&self, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.0.borrow_mut().kind {
            let name = name.to_ascii_lowercase();
            match attributes.iter_mut().find(|(key, _)| *key == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => attributes.push((name, value.to_string())),
            }
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.0.borrow().parent.upgrade().map(NodeRef)
    }

    pub fn children(&self) -> Vec<NodeRef> {
        self.0.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    pub fn ptr_eq(&self, other: &NodeRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Appends `child` as the last child.
    ///
    /// A fragment is spliced: its children move here and it is left empty.
    /// A node that already has a parent is detached from it first.
    pub fn append_child(&self, child: NodeRef) {
        if child.is_fragment() {
            let moved = std::mem::take(&mut child.0.borrow_mut().children);
            for node in moved {
                node.0.borrow_mut().parent = Weak::new();
                self.append_child(node);
            }
            return;
        }

        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child);
    }

    /// Removes this node from its parent, if any.
    pub fn detach(&self) {
        let parent = self.parent();
        if let Some(parent) = parent {
            parent
                .0
                .borrow_mut()
                .children
                .retain(|sibling| !sibling.ptr_eq(self));
        }
        self.0.borrow_mut().parent = Weak::new();
    }

    pub fn clear_children(&self) {
        let removed = std::mem::take(&mut self.0.borrow_mut().children);
        for node in removed {
            node.0.borrow_mut().parent = Weak::new();
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        let data = self.0.borrow();
        match &data.kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Comment(_) => String::new(),
            _ => data.children.iter().map(NodeRef::text_content).collect(),
        }
    }

    pub fn add_listener(&self, event: &str, listener: Listener) {
        self.0
            .borrow_mut()
            .listeners
            .push((event.to_string(), listener));
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.0
            .borrow()
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }

    /// Invokes every listener registered for `event`, in registration order.
    ///
    /// Returns how many listeners ran. Events do not bubble.
    pub fn dispatch(&self, event: &str) -> usize {
        let listeners: Vec<Listener> = self
            .0
            .borrow()
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, listener)| listener.clone())
            .collect();

        let ui_event = UiEvent {
            name: event.to_string(),
            value: self.attr("value"),
        };
        for listener in &listeners {
            listener(&ui_event);
        }
        listeners.len()
    }

    /// All descendants matching `selector`, in document order. The node
    /// itself is never part of the result.
    pub fn query_all(&self, selector: &Selector) -> Vec<NodeRef> {
        let mut found = Vec::new();
        self.collect_matches(selector, &mut found);
        found
    }

    pub fn query(&self, selector: &Selector) -> Option<NodeRef> {
        self.query_all(selector).into_iter().next()
    }

    /// Parses `selector` and runs [`NodeRef::query_all`].
    pub fn select(&self, selector: &str) -> Result<Vec<NodeRef>, DomError> {
        Ok(self.query_all(&Selector::parse(selector)?))
    }

    fn collect_matches(&self, selector: &Selector, found: &mut Vec<NodeRef>) {
        for child in self.children() {
            if selector.matches(&child) {
                found.push(child.clone());
            }
            child.collect_matches(selector, found);
        }
    }

    /// Serialized markup of the children.
    pub fn inner_markup(&self) -> String {
        let mut out = String::new();
        for child in self.0.borrow().children.iter() {
            child.write_markup(&mut out);
        }
        out
    }

    /// Serialized markup of the node itself, including its children.
    pub fn outer_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        let data = self.0.borrow();
        match &data.kind {
            NodeKind::Fragment => {
                for child in &data.children {
                    child.write_markup(out);
                }
            }
            NodeKind::Text(text) => out.push_str(&escape_text(text)),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attr(value));
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in &data.children {
                    child.write_markup(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef")
            .field(&self.outer_markup())
            .finish()
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
