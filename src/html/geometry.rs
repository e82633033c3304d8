use super::document::{Document, NodeId};

/// Read-only view of a laid-out document: structure, text and the
/// geometry a rendering engine reports for each element.
pub trait DocumentGeometry {
    type Node: Copy;

    /// Element children in document order
    fn element_children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn tag_name(&self, node: Self::Node) -> &str;

    fn text_content(&self, node: Self::Node) -> String;

    fn parent_element(&self, node: Self::Node) -> Option<Self::Node>;

    /// Distance from the top of the offset parent, in px
    fn offset_top(&self, node: Self::Node) -> f64;

    /// Nearest positioned ancestor
    fn offset_parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn scroll_height(&self, node: Self::Node) -> f64;
}

impl DocumentGeometry for Document {
    type Node = NodeId;

    fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        Document::element_children(self, node)
    }

    fn tag_name(&self, node: NodeId) -> &str {
        Document::tag_name(self, node)
    }

    fn text_content(&self, node: NodeId) -> String {
        Document::text_content(self, node)
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node)
    }

    fn offset_top(&self, node: NodeId) -> f64 {
        Document::offset_top(self, node)
    }

    fn offset_parent(&self, node: NodeId) -> Option<NodeId> {
        Document::offset_parent(self, node)
    }

    fn scroll_height(&self, node: NodeId) -> f64 {
        Document::scroll_height(self, node)
    }
}
