use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::html::LayoutOptions;
use crate::nav::PageSelectors;

#[derive(Parser)]
#[command(name = "readnav")]
#[command(about = "Document outline and reading-progress navigation with MCP server support")]
#[command(version)]
pub struct Cli {
    /// Log what is being done to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Knobs of the built-in layout engine
#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Window height in px
    #[arg(long, default_value = "800")]
    pub viewport_height: f64,

    /// Characters that fit on one line of text
    #[arg(long, default_value = "80")]
    pub chars_per_line: usize,

    /// Height of one line of text in px
    #[arg(long, default_value = "20")]
    pub line_height: f64,

    /// Report document scrolling on <body> like older engines
    #[arg(long)]
    pub legacy_body_scroll: bool,
}

impl LayoutArgs {
    pub fn options(&self) -> LayoutOptions {
        LayoutOptions {
            viewport_height: self.viewport_height,
            chars_per_line: self.chars_per_line,
            line_height: self.line_height,
            legacy_body_scroll: self.legacy_body_scroll,
        }
    }
}

/// Which elements hold the content, the panel and the scrollbar
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Element whose sections make up the outline (#id, .class or tag)
    #[arg(long, default_value = "article")]
    pub root: String,

    /// Element the navigation panel is mounted into
    #[arg(long, default_value = "#outline")]
    pub container: String,

    /// Element that scrolls the document
    #[arg(long, default_value = "#content")]
    pub viewport: String,

    /// Maximum section nesting to follow
    #[arg(short = 'd', long)]
    pub max_depth: Option<u32>,

    /// Panel height relative to the document height
    #[arg(short, long, default_value = "0.1")]
    pub scale: f64,
}

impl PageArgs {
    pub fn selectors(&self) -> PageSelectors {
        PageSelectors {
            root: self.root.clone(),
            container: self.container.clone(),
            viewport: self.viewport.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Display document title, structure counts and size
    Info {
        /// HTML file to inspect
        path: PathBuf,

        /// Element whose sections make up the outline
        #[arg(long, default_value = "article")]
        root: String,

        /// Element that scrolls the document; the document element when
        /// nothing matches
        #[arg(long, default_value = "#content")]
        viewport: String,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Print the heading outline with positions and word counts
    #[command(alias = "toc")]
    Outline {
        /// HTML file to inspect
        path: PathBuf,

        /// Element whose sections make up the outline
        #[arg(long, default_value = "article")]
        root: String,

        /// Maximum section nesting to follow
        #[arg(short = 'd', long)]
        max_depth: Option<u32>,

        /// Print the heading list as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Mount the navigation panel and print its markup
    Nav {
        /// HTML file to render
        path: PathBuf,

        /// Scroll the viewport to this offset (px) first
        #[arg(long)]
        scroll: Option<f64>,

        #[command(flatten)]
        page: PageArgs,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Replay scroll positions and print reading progress for each
    Progress {
        /// HTML file to read
        path: PathBuf,

        /// Scroll offsets (e.g., "0-end/500,25%,1200")
        offsets: String,

        #[command(flatten)]
        page: PageArgs,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}
