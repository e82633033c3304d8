use anyhow::{Context, Result};

use crate::html::outline::extract;
use crate::html::{Document, NodeId};

use super::session::NavigationSession;

/// Where the outline comes from, where the panel goes, and which element
/// scrolls the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelectors {
    pub root: String,
    pub container: String,
    pub viewport: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        PageSelectors {
            root: "article".to_string(),
            container: "#outline".to_string(),
            viewport: "#content".to_string(),
        }
    }
}

/// Find the first element matching a simple selector: `#id`, `.class` or
/// a tag name
pub fn find(doc: &Document, selector: &str) -> Option<NodeId> {
    let selector = selector.trim();
    if let Some(id) = selector.strip_prefix('#') {
        doc.get_element_by_id(id)
    } else if let Some(class) = selector.strip_prefix('.') {
        doc.elements_by_class(class).into_iter().next()
    } else if selector.is_empty() {
        None
    } else {
        doc.first_element_by_tag(selector)
    }
}

/// The element matching `selector`, or the document element when nothing
/// matches
pub fn find_viewport(doc: &Document, selector: &str) -> NodeId {
    find(doc, selector).unwrap_or_else(|| {
        log::info!(
            "Viewport '{}' not found, scrolling the document element",
            selector
        );
        doc.document_element()
    })
}

/// Extract the outline of the root element and mount a navigation panel
/// for it.
///
/// Falls back to the document element when the viewport selector matches
/// nothing, and creates a scrollable side panel when the container is
/// missing.
pub fn attach(
    doc: &mut Document,
    selectors: &PageSelectors,
    max_depth: Option<u32>,
    scale: f64,
) -> Result<NavigationSession> {
    let root = find(doc, &selectors.root)
        .with_context(|| format!("No element matches root selector '{}'", selectors.root))?;

    let viewport = find_viewport(doc, &selectors.viewport);

    let container = match find(doc, &selectors.container) {
        Some(container) => container,
        None => {
            let container = create_panel(doc, &selectors.container);
            doc.reflow();
            container
        }
    };

    let outline = extract(&*doc, root, max_depth);
    Ok(NavigationSession::mount(
        doc, outline, container, viewport, scale,
    ))
}

/// Add a fixed, scrollable `aside` holding an empty container to the body
fn create_panel(doc: &mut Document, selector: &str) -> NodeId {
    let height = doc.layout_options().viewport_height;

    let panel = doc.create_element("aside");
    doc.set_attr(panel, "class", "outline-panel");
    doc.set_style_property(panel, "position", "fixed");
    doc.set_style_property(panel, "top", "0px");
    doc.set_style_property(panel, "right", "0px");
    doc.set_style_property(panel, "overflow", "auto");
    doc.set_style_property(panel, "height", &format!("{}px", height));

    let container = doc.create_element("div");
    match selector.trim() {
        s if s.starts_with('.') => doc.set_attr(container, "class", &s[1..]),
        s => doc.set_attr(container, "id", s.strip_prefix('#').unwrap_or("outline")),
    }
    doc.append_child(panel, container);

    let body = doc.body();
    doc.append_child(body, panel);
    log::info!("Container '{}' not found, created a side panel", selector);
    container
}
