use crate::html::outline::OutlineNode;

/// Title offset of the root entry, which sits just above the panel
pub const ROOT_TITLE_TOP: f64 = -16.0;

/// One entry of the navigation panel, mirroring an [`OutlineNode`]
#[derive(Debug, Clone, PartialEq)]
pub struct NavEntry {
    pub title: String,
    /// Vertical offset of the title inside the panel, in px
    pub top: f64,
    pub children: Vec<NavEntry>,
}

impl NavEntry {
    /// This entry plus all entries below it
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(NavEntry::count).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Build the entry tree for a whole outline
pub fn build_tree(root: &OutlineNode, scroll_height: f64, scale: f64) -> NavEntry {
    build_entry(root, scroll_height, scale, true)
}

/// Build the entry for `node` and its subtree. Titles are placed at
/// `position × scroll_height × scale`, except the root which gets
/// [`ROOT_TITLE_TOP`].
pub fn build_entry(node: &OutlineNode, scroll_height: f64, scale: f64, is_root: bool) -> NavEntry {
    let top = if is_root {
        ROOT_TITLE_TOP
    } else {
        node.position * scroll_height * scale
    };

    NavEntry {
        title: node.title.clone(),
        top,
        children: node
            .sub
            .iter()
            .map(|child| build_entry(child, scroll_height, scale, false))
            .collect(),
    }
}
