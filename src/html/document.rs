use anyhow::{Context, Result};
use scraper::{ElementRef, Html};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

use super::layout::{self, LayoutBox, LayoutOptions};
use super::text::collapse_whitespace;

/// Handle to a node in a [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    scroll_top: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Scroll,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Window,
    Element(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub target: EventTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Void elements are serialized without a closing tag
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

/// An HTML document held as a node arena, together with the geometry of
/// its last layout pass, per-element scroll offsets and a queue of pending
/// scroll/resize events.
///
/// Nodes removed from the tree stay in the arena but are unreachable.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    boxes: Vec<Option<LayoutBox>>,
    options: LayoutOptions,
    listeners: BTreeMap<ListenerId, (EventTarget, EventKind)>,
    next_listener: u64,
    events: VecDeque<Event>,
}

impl Document {
    pub fn open<P: AsRef<Path>>(path: P, options: LayoutOptions) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read HTML: {}", path.display()))?;
        log::info!("Loaded {} ({} bytes)", path.display(), source.len());
        Ok(Self::parse_with_options(&source, options))
    }

    pub fn parse(source: &str) -> Self {
        Self::parse_with_options(source, LayoutOptions::default())
    }

    /// Parse HTML source and run an initial layout pass
    pub fn parse_with_options(source: &str, options: LayoutOptions) -> Self {
        let html = Html::parse_document(source);
        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            boxes: Vec::new(),
            options,
            listeners: BTreeMap::new(),
            next_listener: 0,
            events: VecDeque::new(),
        };
        doc.root = doc.import_element(html.root_element(), None);
        doc.reflow();
        doc
    }

    fn import_element(&mut self, element: ElementRef<'_>, parent: Option<NodeId>) -> NodeId {
        let value = element.value();
        let id = self.push_node(
            NodeData::Element {
                tag: value.name().to_ascii_lowercase(),
                attrs: value
                    .attrs()
                    .map(|(name, val)| (name.to_string(), val.to_string()))
                    .collect(),
            },
            parent,
        );

        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.import_element(child_element, Some(id));
            } else if let Some(text) = child.value().as_text() {
                let text: &str = text;
                self.push_node(NodeData::Text(text.to_string()), Some(id));
            }
        }

        id
    }

    fn push_node(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent,
            children: Vec::new(),
            scroll_top: 0.0,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The `<html>` element
    pub fn document_element(&self) -> NodeId {
        self.root
    }

    /// The `<body>` element, or the document element if there is none
    pub fn body(&self) -> NodeId {
        self.children(self.root)
            .iter()
            .copied()
            .find(|&child| self.tag_name(child) == "body")
            .unwrap_or(self.root)
    }

    /// Lowercase tag name, or an empty string for text nodes
    pub fn tag_name(&self, id: NodeId) -> &str {
        match &self.node(id).data {
            NodeData::Element { tag, .. } => tag,
            NodeData::Text(_) => "",
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element { .. })
    }

    /// Raw text of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            NodeData::Text(_) => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data {
            match attrs
                .iter_mut()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
            {
                Some((_, existing)) => *existing = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Value of one declaration in the element's inline `style` attribute
    pub fn style_property(&self, id: NodeId, name: &str) -> Option<String> {
        let style = self.attr(id, "style")?;
        parse_style(style)
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Set one declaration in the inline `style` attribute, keeping the others
    pub fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) {
        let mut declarations = self.attr(id, "style").map(parse_style).unwrap_or_default();
        let name = name.to_ascii_lowercase();
        match declarations.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => declarations.push((name, value.to_string())),
        }
        let style = declarations
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr(id, "style", &style);
    }

    /// Concatenated text of all descendant text nodes, like `textContent`
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { .. } => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if let [only] = self.children(id) {
            let only = *only;
            if let NodeData::Text(existing) = &mut self.nodes[only.0].data {
                *existing = text.to_string();
                return;
            }
        }
        self.clear_children(id);
        if !text.is_empty() {
            self.push_node(NodeData::Text(text.to_string()), Some(id));
        }
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(
            NodeData::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: Vec::new(),
            },
            None,
        )
    }

    /// Append `child` to `parent`, detaching it from any previous parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Pre-order list of `id` and every node below it
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    fn find_element(&self, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.is_element(id) && pred(id))
    }

    pub fn get_element_by_id(&self, value: &str) -> Option<NodeId> {
        self.find_element(|id| self.attr(id, "id") == Some(value))
    }

    pub fn first_element_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find_element(|id| self.tag_name(id).eq_ignore_ascii_case(tag))
    }

    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.is_element(id) && self.has_class(id, class))
            .collect()
    }

    /// Text of the `<title>` element, whitespace-collapsed
    pub fn title(&self) -> Option<String> {
        self.first_element_by_tag("title")
            .map(|id| collapse_whitespace(&self.text_content(id)))
            .filter(|title| !title.is_empty())
    }

    /// Serialize `id` and its subtree back to markup
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }

    // Layout and scrolling

    pub fn layout_options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Recompute geometry for the whole tree, then clamp scroll offsets to
    /// the new extents
    pub fn reflow(&mut self) {
        self.boxes = layout::compute(self);
        for index in 0..self.nodes.len() {
            let id = NodeId(index);
            let max = self.max_scroll_top(id);
            let node = &mut self.nodes[index];
            if node.scroll_top > max {
                node.scroll_top = max;
            }
        }
        log::debug!("Reflowed {} nodes", self.nodes.len());
    }

    fn layout_box(&self, id: NodeId) -> Option<&LayoutBox> {
        self.boxes.get(id.0).and_then(Option::as_ref)
    }

    pub fn offset_top(&self, id: NodeId) -> f64 {
        self.layout_box(id).map_or(0.0, |b| b.offset_top)
    }

    pub fn offset_parent(&self, id: NodeId) -> Option<NodeId> {
        self.layout_box(id).and_then(|b| b.offset_parent)
    }

    pub fn client_height(&self, id: NodeId) -> f64 {
        self.layout_box(id).map_or(0.0, |b| b.client_height)
    }

    pub fn scroll_height(&self, id: NodeId) -> f64 {
        self.layout_box(id).map_or(0.0, |b| b.scroll_height)
    }

    pub fn scroll_top(&self, id: NodeId) -> f64 {
        self.node(id).scroll_top
    }

    /// Largest scroll offset `id` accepts
    pub fn max_scroll_top(&self, id: NodeId) -> f64 {
        if self.options.legacy_body_scroll && id == self.body() && id != self.root {
            return self.max_scroll_top(self.root);
        }
        (self.scroll_height(id) - self.client_height(id)).max(0.0)
    }

    /// Scroll `id` to `top`, clamped to its scroll range, and queue a scroll
    /// event at `id` when the offset changed.
    ///
    /// With `legacy_body_scroll`, scrolling the document element moves the
    /// body's offset instead and the document element keeps reporting 0.
    /// The event is still delivered to the document element.
    pub fn set_scroll_top(&mut self, id: NodeId, top: f64) {
        let max = self.max_scroll_top(id);
        let target = if self.options.legacy_body_scroll && id == self.root {
            self.body()
        } else {
            id
        };
        let top = if top.is_finite() { top.clamp(0.0, max) } else { 0.0 };

        let node = &mut self.nodes[target.0];
        if node.scroll_top != top {
            node.scroll_top = top;
            self.events.push_back(Event {
                kind: EventKind::Scroll,
                target: EventTarget::Element(id),
            });
        }
    }

    /// Change the window height, reflow, and queue a resize event
    pub fn resize_viewport(&mut self, height: f64) {
        self.options.viewport_height = height;
        self.reflow();
        self.events.push_back(Event {
            kind: EventKind::Resize,
            target: EventTarget::Window,
        });
    }

    // Events

    pub fn add_event_listener(&mut self, target: EventTarget, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, (target, kind));
        id
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether `listener` is registered for this event's target and kind
    pub fn is_listening(&self, listener: ListenerId, event: &Event) -> bool {
        self.listeners
            .get(&listener)
            .is_some_and(|(target, kind)| *target == event.target && *kind == event.kind)
    }

    /// Take every event queued so far. Events raised while handling them
    /// stay queued for the next call.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
