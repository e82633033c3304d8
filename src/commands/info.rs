use crate::html::outline::{extract, flatten_outline, OutlineNode};
use crate::html::text::word_count;
use crate::html::{Document, LayoutOptions};
use crate::nav::bootstrap::{find, find_viewport};
use anyhow::{Context, Result};
use std::path::Path;

pub fn run<P: AsRef<Path>>(
    path: P,
    root: &str,
    viewport: &str,
    layout: LayoutOptions,
) -> Result<()> {
    let doc = Document::open(&path, layout)?;
    let root_el =
        find(&doc, root).with_context(|| format!("No element matches root selector '{}'", root))?;
    let outline = extract(&doc, root_el, None);

    println!("File: {}", path.as_ref().display());
    if let Some(title) = doc.title() {
        println!("Title: {}", title);
    }
    println!("Headings: {}", flatten_outline(&outline).len());
    println!("Sections: {}", count_sections(&outline));
    println!("Section depth: {}", outline.depth());
    println!("Words: {}", word_count(&doc.text_content(root_el)));

    let scroller = find_viewport(&doc, viewport);
    println!("Document height: {}px", doc.scroll_height(scroller));
    println!("Viewport height: {}px", doc.client_height(scroller));

    Ok(())
}

fn count_sections(node: &OutlineNode) -> usize {
    node.sub.iter().map(|s| 1 + count_sections(s)).sum()
}
