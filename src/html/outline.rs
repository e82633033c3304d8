use serde::Serialize;

use super::geometry::DocumentGeometry;
use super::text::{char_count, collapse_whitespace, word_count};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// A structural grouping no heading has annotated
    #[default]
    Group,
    Heading,
}

/// One heading or structural grouping of a document outline.
///
/// Built once per pass by [`extract`] and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutlineNode {
    pub kind: NodeKind,
    /// Nesting depth, 0 at the extraction root
    pub level: u32,
    /// Text content of the heading, whitespace as in the source
    pub title: String,
    /// Heading offset as a fraction of its offset parent's scroll height
    pub position: f64,
    /// Characters in the text of the heading's parent element
    pub size: usize,
    /// Words in the text of the heading's parent element
    pub words: usize,
    /// Nested sections in document order
    pub sub: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn is_heading(&self) -> bool {
        self.kind == NodeKind::Heading
    }

    /// Number of nested levels below this node
    pub fn depth(&self) -> usize {
        self.sub.iter().map(|s| s.depth() + 1).max().unwrap_or(0)
    }

    /// This node plus all its descendants
    pub fn node_count(&self) -> usize {
        1 + self.sub.iter().map(OutlineNode::node_count).sum::<usize>()
    }
}

/// Extract the outline of `root`.
///
/// Headings (`h1`-`h6`) among the direct children annotate the node for
/// `root`; `section` children become nested nodes, down to `max_depth`
/// levels (`None` for no limit). Everything else is ignored.
///
/// When a grouping has several direct headings, the last one wins.
pub fn extract<G: DocumentGeometry>(
    geometry: &G,
    root: G::Node,
    max_depth: Option<u32>,
) -> OutlineNode {
    let outline = extract_level(geometry, root, max_depth, 0);
    log::info!(
        "Extracted outline: {} node(s), depth {}",
        outline.node_count(),
        outline.depth()
    );
    outline
}

fn extract_level<G: DocumentGeometry>(
    geometry: &G,
    element: G::Node,
    max_depth: Option<u32>,
    level: u32,
) -> OutlineNode {
    let mut node = OutlineNode {
        level,
        ..OutlineNode::default()
    };

    for child in geometry.element_children(element) {
        let tag = geometry.tag_name(child);

        if is_heading_tag(tag) {
            if node.is_heading() {
                log::debug!(
                    "Heading {:?} replaces {:?} at level {}",
                    collapse_whitespace(&geometry.text_content(child)),
                    node.title,
                    level
                );
            }
            annotate_heading(geometry, child, level, &mut node);
        } else if tag.eq_ignore_ascii_case("section") && max_depth.map_or(true, |d| level < d) {
            node.sub.push(extract_level(geometry, child, max_depth, level + 1));
        }
    }

    node
}

fn annotate_heading<G: DocumentGeometry>(
    geometry: &G,
    heading: G::Node,
    level: u32,
    node: &mut OutlineNode,
) {
    // Missing geometry is not guarded: a detached heading ends up with a
    // NaN or infinite position.
    let scroll_height = geometry
        .offset_parent(heading)
        .map_or(0.0, |parent| geometry.scroll_height(parent));
    let section_text = geometry
        .parent_element(heading)
        .map(|parent| geometry.text_content(parent))
        .unwrap_or_default();

    node.kind = NodeKind::Heading;
    node.level = level;
    node.title = geometry.text_content(heading);
    node.position = geometry.offset_top(heading) / scroll_height;
    node.size = char_count(&section_text);
    node.words = word_count(&section_text);
}

fn is_heading_tag(tag: &str) -> bool {
    let bytes = tag.as_bytes();
    bytes.len() == 2 && bytes[0].eq_ignore_ascii_case(&b'h') && (b'1'..=b'6').contains(&bytes[1])
}

/// Flatten the headings of an outline into a list with level info
pub fn flatten_outline(root: &OutlineNode) -> Vec<FlatOutlineEntry> {
    let mut result = Vec::new();
    flatten_outline_recursive(root, &mut result);
    result
}

fn flatten_outline_recursive(node: &OutlineNode, result: &mut Vec<FlatOutlineEntry>) {
    if node.is_heading() {
        result.push(FlatOutlineEntry {
            title: node.title.clone(),
            level: node.level,
            position: node.position,
            size: node.size,
            words: node.words,
        });
    }
    for child in &node.sub {
        flatten_outline_recursive(child, result);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatOutlineEntry {
    pub title: String,
    pub level: u32,
    pub position: f64,
    pub size: usize,
    pub words: usize,
}
