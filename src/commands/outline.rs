use crate::html::outline::{extract, flatten_outline};
use crate::html::text::collapse_whitespace;
use crate::html::{Document, LayoutOptions};
use crate::nav::bootstrap::find;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run<P: AsRef<Path>>(
    path: P,
    root: &str,
    max_depth: Option<u32>,
    json: bool,
    layout: LayoutOptions,
) -> Result<()> {
    let doc = Document::open(&path, layout)?;
    let root_el =
        find(&doc, root).with_context(|| format!("No element matches root selector '{}'", root))?;

    let outline = extract(&doc, root_el, max_depth);
    let flat = flatten_outline(&outline);

    if json {
        println!("{}", serde_json::to_string_pretty(&flat)?);
        return Ok(());
    }

    if flat.is_empty() {
        println!("No headings found.");
        return Ok(());
    }

    for entry in flat {
        let indent = "  ".repeat(entry.level as usize);
        println!(
            "{}{} ({:.1}%, {} words)",
            indent,
            collapse_whitespace(&entry.title),
            entry.position * 100.0,
            entry.words
        );
    }

    Ok(())
}
