//! pagemark - interactive element mapping for web pages
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pagemark::cli::{handle_command, CommandResult};
use pagemark::{Config, MemoryDocument, PageHost, Repl};

/// pagemark - map the interactive elements of a page
#[derive(Parser, Debug)]
#[command(name = "pagemark")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON page fixture to load (an empty page when omitted)
    #[arg(long, short = 'p')]
    page: Option<PathBuf>,

    /// Run a single command and exit (non-interactive)
    #[arg(long, short = 'c')]
    command: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Row height used to group elements into visual lines
    #[arg(long)]
    row_height: Option<u32>,

    /// Margin around the viewport inside which elements still count
    #[arg(long)]
    viewport_buffer: Option<f64>,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,
}

fn init_logging(config: &Config, debug: bool) {
    let env_filter = if debug {
        EnvFilter::new("pagemark=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.logging.filter.as_str()))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load(),
    };

    // Apply CLI overrides
    if let Some(row_height) = args.row_height {
        config.analyzer.row_height = row_height;
    }
    if let Some(buffer) = args.viewport_buffer {
        config.analyzer.viewport_buffer = buffer;
    }
    config.validate()?;

    init_logging(&config, args.debug);

    let document = match &args.page {
        Some(path) => MemoryDocument::load(path)
            .with_context(|| format!("loading page fixture {}", path.display()))?,
        None => MemoryDocument::new("about:blank", ""),
    };
    let mut host = PageHost::new(document, config);

    // Single command mode
    if let Some(command) = args.command {
        if let CommandResult::Handled(output) = handle_command(&command, &mut host)? {
            println!("{}", output);
        }
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::new(host);
    repl.run()?;

    Ok(())
}
