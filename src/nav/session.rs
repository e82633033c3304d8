use crate::html::document::{Event, EventKind, EventTarget, ListenerId};
use crate::html::outline::{extract, OutlineNode};
use crate::html::text::collapse_whitespace;
use crate::html::{Document, NodeId};

use super::entry::{build_tree, NavEntry};
use super::progress::{self, ProgressUpdate, ScrollMetrics};

/// A navigation panel mounted into a document.
///
/// Owns the outline it was built from, handles to the elements it
/// created and its scroll/resize listener registrations. Nothing is
/// released implicitly: call [`NavigationSession::destroy`] to unmount.
#[derive(Debug)]
pub struct NavigationSession {
    outline: OutlineNode,
    scale: f64,
    requested_viewport: NodeId,
    viewport: NodeId,
    container: NodeId,
    outline_list: NodeId,
    progress_bar: NodeId,
    progress_info: NodeId,
    listeners: Vec<ListenerId>,
    last_update: Option<ProgressUpdate>,
}

/// Pick the element whose scroll offset tracks the document.
///
/// Some engines report the document element's offset as 0 and move the
/// body's instead; when the body is ahead, it becomes the scroll source.
pub fn resolve_scroll_source(doc: &Document, viewport: NodeId) -> NodeId {
    let body = doc.body();
    if viewport == doc.document_element() && doc.scroll_top(viewport) < doc.scroll_top(body) {
        log::debug!("Document element scroll lags behind body, using body as scroll source");
        body
    } else {
        viewport
    }
}

impl NavigationSession {
    /// Replace the contents of `container` with the navigation panel for
    /// `outline` and start listening for scroll and resize events.
    pub fn mount(
        doc: &mut Document,
        outline: OutlineNode,
        container: NodeId,
        viewport: NodeId,
        scale: f64,
    ) -> Self {
        let requested_viewport = viewport;
        let viewport = resolve_scroll_source(doc, viewport);
        let scroll_height = doc.scroll_height(viewport);
        let entries = build_tree(&outline, scroll_height, scale);

        doc.clear_children(container);

        let outline_list = doc.create_element("ul");
        doc.set_attr(outline_list, "class", "outline");
        doc.set_style_property(
            outline_list,
            "height",
            &format!("{}px", scroll_height * scale),
        );

        let progress_bar = doc.create_element("div");
        doc.set_attr(progress_bar, "class", "outline-progress");
        doc.append_child(outline_list, progress_bar);

        let progress_info = doc.create_element("div");
        doc.set_attr(progress_info, "class", "outline-progress-info");
        doc.append_child(progress_bar, progress_info);

        let listeners = vec![
            doc.add_event_listener(EventTarget::Window, EventKind::Resize),
            doc.add_event_listener(EventTarget::Element(requested_viewport), EventKind::Scroll),
        ];

        let root_item = materialize(doc, &entries);
        doc.append_child(outline_list, root_item);
        doc.append_child(container, outline_list);
        doc.reflow();

        log::info!(
            "Mounted navigation: {} entries over {} levels, panel height {}px",
            entries.count(),
            entries.depth(),
            scroll_height * scale
        );

        NavigationSession {
            outline,
            scale,
            requested_viewport,
            viewport,
            container,
            outline_list,
            progress_bar,
            progress_info,
            listeners,
            last_update: None,
        }
    }

    pub fn outline(&self) -> &OutlineNode {
        &self.outline
    }

    /// The viewport the caller asked for
    pub fn requested_viewport(&self) -> NodeId {
        self.requested_viewport
    }

    /// The element scroll offsets are actually read from
    pub fn scroll_source(&self) -> NodeId {
        self.viewport
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn last_update(&self) -> Option<ProgressUpdate> {
        self.last_update
    }

    /// Recompute progress from the current scroll state and write it to
    /// the progress bar, the info box and the panel's scroll offset
    pub fn update(&mut self, doc: &mut Document) -> ProgressUpdate {
        // A page mounted at the top cannot tell yet whether the body holds
        // the document offset. Once it does, stick with the body.
        self.viewport = resolve_scroll_source(doc, self.viewport);

        let viewport = scroll_metrics(doc, self.viewport);
        let container_height = doc.client_height(self.container);
        let panel = doc.parent(self.container);
        let panel_metrics = panel.map(|panel| scroll_metrics(doc, panel));

        let update = progress::compute(
            self.outline.position,
            self.outline.words,
            &viewport,
            container_height,
            panel_metrics.as_ref(),
        );

        doc.set_style_property(
            self.progress_bar,
            "height",
            &format!("{}px", update.bar_height),
        );
        if let Some(panel) = panel {
            doc.set_scroll_top(panel, update.panel_scroll_top);
        }
        doc.set_text_content(
            self.progress_info,
            &format!("{} words remaining", update.remaining_words),
        );

        log::debug!(
            "Progress {:.3}, {} words remaining",
            update.progress,
            update.remaining_words
        );

        self.last_update = Some(update);
        update
    }

    /// Run the update if this session listens for `event`
    pub fn handle_event(&mut self, doc: &mut Document, event: &Event) -> Option<ProgressUpdate> {
        let subscribed = self
            .listeners
            .iter()
            .any(|&listener| doc.is_listening(listener, event));
        subscribed.then(|| self.update(doc))
    }

    /// Deliver the events queued on `doc`, one at a time, and return the
    /// updates they produced
    pub fn dispatch(&mut self, doc: &mut Document) -> Vec<ProgressUpdate> {
        doc.take_events()
            .into_iter()
            .filter_map(|event| self.handle_event(doc, &event))
            .collect()
    }

    /// Remove the listeners and empty the container
    pub fn destroy(self, doc: &mut Document) {
        for listener in &self.listeners {
            doc.remove_event_listener(*listener);
        }
        doc.clear_children(self.container);
        log::info!(
            "Navigation unmounted, {} listener(s) still registered",
            doc.listener_count()
        );
    }

    /// Tear the panel down and build it again from a fresh extraction of
    /// `root`, e.g. after the document structure changed
    pub fn rebuild(self, doc: &mut Document, root: NodeId, max_depth: Option<u32>) -> Self {
        let container = self.container;
        let viewport = self.requested_viewport;
        let scale = self.scale;
        self.destroy(doc);

        doc.reflow();
        let outline = extract(&*doc, root, max_depth);
        NavigationSession::mount(doc, outline, container, viewport, scale)
    }
}

fn scroll_metrics(doc: &Document, id: NodeId) -> ScrollMetrics {
    ScrollMetrics {
        scroll_top: doc.scroll_top(id),
        scroll_height: doc.scroll_height(id),
        client_height: doc.client_height(id),
    }
}

/// Create the `li` for `entry`, with its title and nested list
fn materialize(doc: &mut Document, entry: &NavEntry) -> NodeId {
    let item = doc.create_element("li");

    let title = doc.create_element("div");
    doc.set_attr(title, "class", "outline-title");
    doc.set_style_property(title, "position", "absolute");
    doc.set_style_property(title, "right", "0px");
    doc.set_style_property(title, "top", &format!("{}px", entry.top));
    doc.set_text_content(title, &collapse_whitespace(&entry.title));
    doc.append_child(item, title);

    if !entry.children.is_empty() {
        let list = doc.create_element("ul");
        doc.set_attr(list, "class", "outline-section");
        for child in &entry.children {
            let child_item = materialize(doc, child);
            doc.append_child(list, child_item);
        }
        doc.append_child(item, list);
    }

    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::LayoutOptions;

    /// Page of 2000px: a 1000-word article in a scrollable frame, with the
    /// outline panel beside it
    fn page() -> String {
        let paragraph = format!("<p>{}</p>", "word ".repeat(16).trim_end());
        let mut article = String::from("<article><h1>Book</h1>");
        for chapter in 1..=3 {
            article.push_str(&format!("<section><h2>Chapter {}</h2>", chapter));
            for _ in 0..30 {
                article.push_str(&paragraph);
            }
            article.push_str(&format!(
                "<section><h3>Part {}.1</h3>{}</section></section>",
                chapter, paragraph
            ));
        }
        article.push_str("</article>");

        format!(
            r#"<html><body>
<div id="content" style="position: relative; overflow: auto; height: 500px">{}</div>
<aside id="panel" style="position: fixed; top: 0px; overflow: auto; height: 100px"><div id="outline"><p>placeholder</p></div></aside>
</body></html>"#,
            article
        )
    }

    fn setup(scale: f64) -> (Document, NavigationSession) {
        let mut doc = Document::parse(&page());
        let article = doc.first_element_by_tag("article").unwrap();
        let container = doc.get_element_by_id("outline").unwrap();
        let viewport = doc.get_element_by_id("content").unwrap();
        let outline = extract(&doc, article, None);
        let session = NavigationSession::mount(&mut doc, outline, container, viewport, scale);
        (doc, session)
    }

    fn count_tag(doc: &Document, root: NodeId, tag: &str) -> usize {
        doc.descendants(root)
            .into_iter()
            .filter(|&id| doc.tag_name(id) == tag)
            .count()
    }

    fn list_depth(doc: &Document, id: NodeId) -> usize {
        let below = doc
            .element_children(id)
            .into_iter()
            .map(|child| list_depth(doc, child))
            .max()
            .unwrap_or(0);
        if doc.has_class(id, "outline-section") {
            below + 1
        } else {
            below
        }
    }

    #[test]
    fn test_mount_structure() {
        let (doc, session) = setup(0.1);
        let container = session.container();

        // the placeholder is gone, only the outline list remains
        assert_eq!(doc.element_children(container), vec![session.outline_list]);
        assert!(doc.has_class(session.outline_list, "outline"));
        assert!(doc.has_class(session.progress_bar, "outline-progress"));
        assert!(doc.has_class(session.progress_info, "outline-progress-info"));
        assert_eq!(doc.parent(session.progress_info), Some(session.progress_bar));

        let outline = session.outline();
        assert_eq!(count_tag(&doc, container, "li"), outline.node_count());
        assert_eq!(
            doc.elements_by_class("outline-title").len(),
            outline.node_count()
        );
        assert_eq!(list_depth(&doc, container), outline.depth());
    }

    #[test]
    fn test_titles_are_collapsed_for_display() {
        let mut doc = Document::parse(
            r#"<html><body><article><h1>  Two
            lines &lt;b&gt;</h1></article><div id="outline"></div></body></html>"#,
        );
        let article = doc.first_element_by_tag("article").unwrap();
        let container = doc.get_element_by_id("outline").unwrap();
        let outline = extract(&doc, article, None);
        let root = doc.document_element();
        let session = NavigationSession::mount(&mut doc, outline, container, root, 0.1);

        let title = doc.elements_by_class("outline-title")[0];
        assert_eq!(doc.text_content(title), "Two lines <b>");
        assert!(session.outline().title.starts_with("  Two\n"));
        assert!(doc.outer_html(title).contains("Two lines &lt;b&gt;"));
    }

    #[test]
    fn test_mount_geometry() {
        let (doc, session) = setup(0.1);
        let content = doc.get_element_by_id("content").unwrap();
        assert_eq!(doc.scroll_height(content), 2000.0);
        assert_eq!(
            doc.style_property(session.outline_list, "height").as_deref(),
            Some("200px")
        );
        assert_eq!(doc.client_height(session.container()), 200.0);

        let titles = doc.elements_by_class("outline-title");
        let tops: Vec<_> = titles
            .iter()
            .map(|&t| doc.style_property(t, "top").unwrap())
            .collect();
        assert_eq!(tops[0], "-16px");
        assert_eq!(doc.text_content(titles[1]), "Chapter 1");
        // Chapter 1 starts after the 20px h1 of a 2000px document
        assert_eq!(tops[1], "2px");
    }

    #[test]
    fn test_scroll_updates_progress() {
        let (mut doc, mut session) = setup(0.1);
        let content = session.requested_viewport();
        assert_eq!(session.scroll_source(), content);

        doc.set_scroll_top(content, 1000.0);
        let updates = session.dispatch(&mut doc);
        assert_eq!(updates.len(), 1);

        let update = updates[0];
        assert_eq!(update.progress, 0.5);
        let half = (session.outline().words as f64 * 0.5).round() as i64;
        assert_eq!(update.remaining_words, half);
        assert_eq!(update.bar_height, 100);
        // panel: 200px of content in a 100px frame
        assert_eq!(update.panel_scroll_top, 50.0);

        let panel = doc.get_element_by_id("panel").unwrap();
        assert_eq!(doc.scroll_top(panel), 50.0);
        assert_eq!(
            doc.style_property(session.progress_bar, "height").as_deref(),
            Some("100px")
        );
        assert_eq!(
            doc.text_content(session.progress_info),
            format!("{} words remaining", update.remaining_words)
        );
        assert_eq!(session.last_update(), Some(update));
    }

    #[test]
    fn test_progress_at_top() {
        let (mut doc, mut session) = setup(0.1);
        let update = session.update(&mut doc);
        assert_eq!(update.progress, 0.0);
        assert_eq!(update.remaining_words, session.outline().words as i64);
    }

    #[test]
    fn test_resize_triggers_update() {
        let (mut doc, mut session) = setup(0.1);
        doc.resize_viewport(600.0);
        let updates = session.dispatch(&mut doc);
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn test_unrelated_scroll_is_ignored() {
        let (mut doc, mut session) = setup(0.1);
        let panel = doc.get_element_by_id("panel").unwrap();
        doc.set_scroll_top(panel, 40.0);
        assert!(session.dispatch(&mut doc).is_empty());
        assert_eq!(session.last_update(), None);
    }

    #[test]
    fn test_destroy_releases_listeners() {
        let (mut doc, session) = setup(0.1);
        let container = session.container();
        let content = session.requested_viewport();
        assert_eq!(doc.listener_count(), 2);

        session.destroy(&mut doc);
        assert_eq!(doc.listener_count(), 0);
        assert!(doc.children(container).is_empty());

        doc.set_scroll_top(content, 300.0);
        assert_eq!(doc.take_events().len(), 1);
    }

    #[test]
    fn test_rebuild_after_structure_change() {
        let (mut doc, session) = setup(0.1);
        let before = session.outline().node_count();

        let article = doc.first_element_by_tag("article").unwrap();
        let section = doc.create_element("section");
        let heading = doc.create_element("h2");
        doc.set_text_content(heading, "Appendix");
        doc.append_child(section, heading);
        doc.append_child(article, section);

        let session = session.rebuild(&mut doc, article, None);
        assert_eq!(session.outline().node_count(), before + 1);
        assert_eq!(doc.listener_count(), 2);
        assert_eq!(
            count_tag(&doc, session.container(), "li"),
            session.outline().node_count()
        );
    }

    #[test]
    fn test_body_substitutes_lagging_document_element() {
        let text = "word ".repeat(4000);
        let source = format!(
            r#"<html><body><article><h1>Long</h1><p>{}</p></article><div id="outline"></div></body></html>"#,
            text
        );
        let options = LayoutOptions {
            legacy_body_scroll: true,
            ..LayoutOptions::default()
        };
        let mut doc = Document::parse_with_options(&source, options);
        let root = doc.document_element();
        let body = doc.body();
        let article = doc.first_element_by_tag("article").unwrap();
        let container = doc.get_element_by_id("outline").unwrap();

        doc.set_scroll_top(root, 500.0);
        doc.take_events();
        assert_eq!(resolve_scroll_source(&doc, root), body);

        let outline = extract(&doc, article, None);
        let mut session = NavigationSession::mount(&mut doc, outline, container, root, 0.1);
        assert_eq!(session.scroll_source(), body);

        doc.set_scroll_top(root, 1000.0);
        let updates = session.dispatch(&mut doc);
        assert_eq!(updates.len(), 1);
        let expected = 1000.0 / doc.scroll_height(body);
        assert_eq!(updates[0].progress, expected);
    }

    #[test]
    fn test_body_takes_over_after_mounting_at_top() {
        let text = "word ".repeat(4000);
        let source = format!(
            r#"<html><body><article><h1>Long</h1><p>{}</p></article><div id="outline"></div></body></html>"#,
            text
        );
        let options = LayoutOptions {
            legacy_body_scroll: true,
            ..LayoutOptions::default()
        };
        let mut doc = Document::parse_with_options(&source, options);
        let root = doc.document_element();
        let body = doc.body();
        let article = doc.first_element_by_tag("article").unwrap();
        let container = doc.get_element_by_id("outline").unwrap();

        let outline = extract(&doc, article, None);
        let mut session = NavigationSession::mount(&mut doc, outline, container, root, 0.1);
        assert_eq!(session.scroll_source(), root);

        doc.set_scroll_top(root, 1000.0);
        let updates = session.dispatch(&mut doc);
        assert_eq!(updates.len(), 1);
        assert_eq!(session.scroll_source(), body);
        assert_eq!(updates[0].progress, 1000.0 / doc.scroll_height(body));
        assert!(updates[0].remaining_words < session.outline().words as i64);
    }

    #[test]
    fn test_document_element_kept_when_in_sync() {
        let doc = Document::parse("<html><body><p>x</p></body></html>");
        let root = doc.document_element();
        assert_eq!(resolve_scroll_source(&doc, root), root);
    }
}
