//! A deterministic block-flow approximation of a browser layout pass.
//!
//! Text runs wrap at a fixed number of characters per line and block
//! children stack vertically without margins. This gives the outline code
//! the offsets and scroll extents a rendering engine would report, close
//! enough for proportional navigation.

use regex::Regex;
use std::sync::OnceLock;

use super::document::{Document, NodeId};
use super::text::{char_count, collapse_whitespace};

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Height of the window, in px
    pub viewport_height: f64,
    pub chars_per_line: usize,
    pub line_height: f64,
    /// Report document scrolling on `<body>` instead of `<html>`, like
    /// older WebKit/Blink engines did
    pub legacy_body_scroll: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            viewport_height: 800.0,
            chars_per_line: 80,
            line_height: 20.0,
            legacy_body_scroll: false,
        }
    }
}

/// Geometry of one laid-out element. `top` is in document content
/// coordinates and ignores scrolling.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutBox {
    pub top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
    pub offset_parent: Option<NodeId>,
    pub offset_top: f64,
}

const SKIPPED_TAGS: &[&str] = &[
    "head", "link", "meta", "noscript", "script", "style", "template", "title",
];

const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i", "img", "kbd",
    "label", "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

fn px_pattern() -> &'static Regex {
    static PX: OnceLock<Regex> = OnceLock::new();
    PX.get_or_init(|| {
        Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*(?:px)?\s*$").expect("static px pattern is valid")
    })
}

/// Parse a CSS length such as `120px` or `120`
pub fn parse_px(value: &str) -> Option<f64> {
    px_pattern()
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub(crate) fn compute(doc: &Document) -> Vec<Option<LayoutBox>> {
    let mut engine = Engine {
        doc,
        options: doc.layout_options(),
        boxes: vec![None; doc.node_count()],
    };
    engine.layout(doc.document_element(), 0.0, None);
    engine.boxes
}

struct Engine<'a> {
    doc: &'a Document,
    options: &'a LayoutOptions,
    boxes: Vec<Option<LayoutBox>>,
}

/// Text accumulated between two block children
#[derive(Default)]
struct InlineRun {
    chars: usize,
}

impl InlineRun {
    fn push(&mut self, text: &str) {
        let text = collapse_whitespace(text);
        if text.is_empty() {
            return;
        }
        if self.chars > 0 {
            self.chars += 1;
        }
        self.chars += char_count(&text);
    }
}

impl Engine<'_> {
    fn is_rendered(&self, id: NodeId) -> bool {
        let tag = self.doc.tag_name(id);
        !SKIPPED_TAGS.contains(&tag)
            && self.doc.attr(id, "hidden").is_none()
            && self.doc.style_property(id, "display").as_deref() != Some("none")
    }

    fn top_of(&self, id: Option<NodeId>) -> f64 {
        id.and_then(|id| self.boxes[id.index()].map(|b| b.top))
            .unwrap_or(0.0)
    }

    fn run_height(&self, run: &InlineRun) -> f64 {
        if run.chars == 0 {
            return 0.0;
        }
        let per_line = self.options.chars_per_line.max(1);
        let lines = run.chars.div_ceil(per_line);
        lines as f64 * self.options.line_height
    }

    /// Lay out `id` starting at `top` and return the height it takes in its
    /// parent's flow
    fn layout(&mut self, id: NodeId, top: f64, offset_parent: Option<NodeId>) -> f64 {
        if !self.is_rendered(id) {
            return 0.0;
        }

        let doc = self.doc;
        let position = doc.style_property(id, "position");
        let out_of_flow = matches!(position.as_deref(), Some("absolute") | Some("fixed"));
        let positioned = position.as_deref().is_some_and(|p| p != "static");
        let top = if out_of_flow {
            match doc.style_property(id, "top").and_then(|v| parse_px(&v)) {
                Some(offset) => self.top_of(offset_parent) + offset,
                None => top,
            }
        } else {
            top
        };

        let is_root = id == doc.document_element();
        let is_body = id == doc.body();
        let own_offset_parent = if is_root || is_body { None } else { offset_parent };
        let child_offset_parent = if is_body || positioned {
            Some(id)
        } else {
            offset_parent
        };

        // Children need this element's top before their own offsets can be
        // resolved, so record a provisional box first.
        self.boxes[id.index()] = Some(LayoutBox {
            top,
            offset_parent: own_offset_parent,
            offset_top: top - self.top_of(own_offset_parent),
            ..LayoutBox::default()
        });

        let content = self.layout_children(id, top, child_offset_parent);
        let height = doc
            .style_property(id, "height")
            .and_then(|v| parse_px(&v))
            .unwrap_or(content);
        let client_height = if is_root {
            self.options.viewport_height
        } else {
            height
        };

        if let Some(layout_box) = self.boxes[id.index()].as_mut() {
            layout_box.client_height = client_height;
            layout_box.scroll_height = client_height.max(content);
        }

        if out_of_flow {
            0.0
        } else {
            height
        }
    }

    fn layout_children(&mut self, id: NodeId, top: f64, offset_parent: Option<NodeId>) -> f64 {
        let doc = self.doc;
        let mut cursor = top;
        let mut run = InlineRun::default();

        for &child in doc.children(id) {
            if let Some(text) = doc.text(child) {
                run.push(text);
                continue;
            }
            if !self.is_rendered(child) {
                continue;
            }

            let tag = doc.tag_name(child);
            if tag == "br" {
                cursor += self.run_height(&run).max(self.options.line_height);
                run = InlineRun::default();
            } else if INLINE_TAGS.contains(&tag) {
                self.place_inline(child, cursor, offset_parent);
                run.push(&doc.text_content(child));
            } else {
                cursor += self.run_height(&run);
                run = InlineRun::default();
                cursor += self.layout(child, cursor, offset_parent);
            }
        }

        cursor += self.run_height(&run);
        cursor - top
    }

    /// Inline elements and everything inside them share the line box they
    /// start on
    fn place_inline(&mut self, id: NodeId, top: f64, offset_parent: Option<NodeId>) {
        let line_height = self.options.line_height;
        let offset_top = top - self.top_of(offset_parent);
        for node in self.doc.descendants(id) {
            if self.doc.is_element(node) {
                self.boxes[node.index()] = Some(LayoutBox {
                    top,
                    client_height: line_height,
                    scroll_height: line_height,
                    offset_parent,
                    offset_top,
                });
            }
        }
    }
}
