use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};

use crate::commands::nav::{render, NavOptions};
use crate::commands::progress::sample;
use crate::html::outline::{extract, flatten_outline};
use crate::html::text::word_count;
use crate::html::{Document, LayoutOptions};
use crate::nav::bootstrap::{find, find_viewport};
use crate::nav::PageSelectors;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the HTML file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OutlineRequest {
    #[schemars(description = "Path to the HTML file")]
    pub path: String,
    #[schemars(description = "Element whose sections make up the outline: #id, .class or tag (default: article)")]
    #[serde(default = "default_root")]
    pub root: String,
    #[schemars(description = "Maximum section nesting to follow (default: unlimited)")]
    #[serde(default)]
    pub max_depth: Option<u32>,
}

fn default_root() -> String {
    PageSelectors::default().root
}

fn default_scale() -> f64 {
    0.1
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NavRequest {
    #[schemars(description = "Path to the HTML file")]
    pub path: String,
    #[schemars(description = "Panel height relative to the document height (default: 0.1)")]
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[schemars(description = "Scroll offset in px to render the panel at (default: top)")]
    #[serde(default)]
    pub scroll: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProgressRequest {
    #[schemars(description = "Path to the HTML file")]
    pub path: String,
    #[schemars(description = "Scroll offsets (e.g., '0-end/500,25%,1200')")]
    pub offsets: String,
    #[schemars(description = "Panel height relative to the document height (default: 0.1)")]
    #[serde(default = "default_scale")]
    pub scale: f64,
}

#[derive(Debug, Clone)]
pub struct OutlineServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl OutlineServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for OutlineServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl OutlineServer {
    #[tool(description = "Get HTML document metadata: title, heading and section counts, word count and rendered height")]
    fn html_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let doc = match Document::open(&path, LayoutOptions::default()) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };
        let root = match find(&doc, &default_root()) {
            Some(r) => r,
            None => return "Error: No <article> element found".to_string(),
        };
        let outline = extract(&doc, root, None);
        let scroller = find_viewport(&doc, &PageSelectors::default().viewport);

        let result = InfoResult {
            path,
            title: doc.title(),
            heading_count: flatten_outline(&outline).len(),
            section_depth: outline.depth(),
            words: word_count(&doc.text_content(root)),
            document_height: doc.scroll_height(scroller),
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Get the heading outline of an HTML document with each heading's relative position and section word count")]
    fn html_outline(&self, Parameters(req): Parameters<OutlineRequest>) -> String {
        let doc = match Document::open(&req.path, LayoutOptions::default()) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };
        let root = match find(&doc, &req.root) {
            Some(r) => r,
            None => return format!("Error: No element matches root selector '{}'", req.root),
        };

        let outline = extract(&doc, root, req.max_depth);
        let result: Vec<OutlineEntryResult> = flatten_outline(&outline)
            .into_iter()
            .map(|e| OutlineEntryResult {
                title: e.title,
                level: e.level,
                position: e.position,
                size: e.size,
                words: e.words,
            })
            .collect();
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Render the navigation panel for an HTML document and return its markup")]
    fn html_nav(&self, Parameters(req): Parameters<NavRequest>) -> String {
        let options = NavOptions {
            scale: req.scale,
            scroll: req.scroll,
            ..NavOptions::default()
        };
        match render(&req.path, &options, LayoutOptions::default()) {
            Ok(markup) => markup,
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Compute reading progress and remaining words of an HTML document at a series of scroll offsets. Use range syntax like '0-end/500,25%'.")]
    fn html_progress(&self, Parameters(req): Parameters<ProgressRequest>) -> String {
        let options = NavOptions {
            scale: req.scale,
            ..NavOptions::default()
        };
        match sample(&req.path, &req.offsets, &options, LayoutOptions::default()) {
            Ok(report) => {
                let result: Vec<ProgressResult> = report
                    .samples
                    .into_iter()
                    .map(|s| ProgressResult {
                        offset: s.offset,
                        progress: s.update.progress,
                        bar_height: s.update.bar_height,
                        remaining_words: s.update.remaining_words,
                    })
                    .collect();
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InfoResult {
    pub path: String,
    pub title: Option<String>,
    pub heading_count: usize,
    pub section_depth: usize,
    pub words: usize,
    pub document_height: f64,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OutlineEntryResult {
    pub title: String,
    pub level: u32,
    pub position: f64,
    pub size: usize,
    pub words: usize,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ProgressResult {
    pub offset: f64,
    pub progress: f64,
    pub bar_height: i64,
    pub remaining_words: i64,
}

impl ServerHandler for OutlineServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Document outline and reading-progress tools for HTML files. Use html_info for \
                 an overview, html_outline for the heading tree, html_nav to render the \
                 navigation panel, and html_progress to see how far a reader is at given scroll \
                 offsets."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = OutlineServer::new();
    log::info!("Serving MCP over stdio");

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
