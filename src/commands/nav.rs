use crate::html::{Document, LayoutOptions};
use crate::nav::{attach, NavigationSession, PageSelectors};
use anyhow::Result;
use std::path::Path;

pub struct NavOptions {
    pub selectors: PageSelectors,
    pub max_depth: Option<u32>,
    pub scale: f64,
    pub scroll: Option<f64>,
}

impl Default for NavOptions {
    fn default() -> Self {
        NavOptions {
            selectors: PageSelectors::default(),
            max_depth: None,
            scale: 0.1,
            scroll: None,
        }
    }
}

/// Load a document and mount the navigation panel into it
pub fn load<P: AsRef<Path>>(
    path: P,
    options: &NavOptions,
    layout: LayoutOptions,
) -> Result<(Document, NavigationSession)> {
    let mut doc = Document::open(&path, layout)?;
    let session = attach(&mut doc, &options.selectors, options.max_depth, options.scale)?;
    Ok((doc, session))
}

/// Mount the panel, bring it in sync with the scroll position and return
/// its markup
pub fn render<P: AsRef<Path>>(path: P, options: &NavOptions, layout: LayoutOptions) -> Result<String> {
    let (mut doc, mut session) = load(&path, options, layout)?;
    log::info!(
        "Reading scroll offsets from <{}>",
        doc.tag_name(session.scroll_source())
    );

    if let Some(offset) = options.scroll {
        doc.set_scroll_top(session.requested_viewport(), offset);
        session.dispatch(&mut doc);
    }
    if session.last_update().is_none() {
        session.update(&mut doc);
    }

    Ok(doc.outer_html(session.container()))
}

pub fn run<P: AsRef<Path>>(path: P, options: &NavOptions, layout: LayoutOptions) -> Result<()> {
    println!("{}", render(path, options, layout)?);
    Ok(())
}
