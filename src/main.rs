mod cli;
mod commands;
mod html;
mod mcp;
mod nav;
mod scroll_range;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Info {
            path,
            root,
            viewport,
            layout,
        } => {
            commands::info::run(&path, &root, &viewport, layout.options())?;
        }
        Commands::Outline {
            path,
            root,
            max_depth,
            json,
            layout,
        } => {
            commands::outline::run(&path, &root, max_depth, json, layout.options())?;
        }
        Commands::Nav {
            path,
            scroll,
            page,
            layout,
        } => {
            let options = commands::nav::NavOptions {
                selectors: page.selectors(),
                max_depth: page.max_depth,
                scale: page.scale,
                scroll,
            };
            commands::nav::run(&path, &options, layout.options())?;
        }
        Commands::Progress {
            path,
            offsets,
            page,
            layout,
        } => {
            let options = commands::nav::NavOptions {
                selectors: page.selectors(),
                max_depth: page.max_depth,
                scale: page.scale,
                scroll: None,
            };
            commands::progress::run(&path, &offsets, &options, layout.options())?;
        }
    }

    Ok(())
}

/// Logs go to stderr so the MCP transport on stdout stays clean.
/// `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
