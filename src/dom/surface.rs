use crate::error::DomError;
use crate::node::{Listener, NodeRef};
use crate::parse::parse_fragment;

/// The render-target capability views draw into.
///
/// Implementations own the actual UI tree. Views only ever go through these
/// operations, so a browser, terminal or in-memory backend can be swapped in
/// without touching view code.
pub trait Surface {
    /// Handle to a node. Cloning must yield another handle to the same node.
    type Node: Clone;

    /// Parses markup into a detached fragment.
    fn parse(&self, markup: &str) -> Result<Self::Node, DomError>;

    /// Creates an empty detached fragment.
    fn create_fragment(&self) -> Self::Node;

    fn create_element(&self, tag: &str) -> Self::Node;

    fn clear_children(&self, node: &Self::Node);

    /// Appends `child` to `parent`. Appending a fragment moves its children,
    /// in one operation.
    fn append(&self, parent: &Self::Node, child: Self::Node);

    /// Every descendant of `root` matching `selector`, in document order.
    fn query_all(&self, root: &Self::Node, selector: &str) -> Result<Vec<Self::Node>, DomError>;

    /// Attaches a listener for the UI event `event` to `node`.
    fn listen(&self, node: &Self::Node, event: &str, listener: Listener);
}

/// The in-memory [`Surface`], backed by [`NodeRef`] trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct Document;

impl Document {
    pub fn new() -> Self {
        Self
    }
}

impl Surface for Document {
    type Node = NodeRef;

    fn parse(&self, markup: &str) -> Result<NodeRef, DomError> {
        parse_fragment(markup)
    }

    fn create_fragment(&self) -> NodeRef {
        NodeRef::fragment()
    }

    fn create_element(&self, tag: &str) -> NodeRef {
        NodeRef::element(tag)
    }

    fn clear_children(&self, node: &NodeRef) {
        node.clear_children();
    }

    fn append(&self, parent: &NodeRef, child: NodeRef) {
        parent.append_child(child);
    }

    fn query_all(&self, root: &NodeRef, selector: &str) -> Result<Vec<NodeRef>, DomError> {
        root.select(selector)
    }

    fn listen(&self, node: &NodeRef, event: &str, listener: Listener) {
        node.add_listener(event, listener);
    }
}
