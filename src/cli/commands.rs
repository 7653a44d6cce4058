//! CLI commands implementation.

mod crawl;
mod proxy;
mod sanitize;
mod schema;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::load_settings;

use crawl::cmd_crawl;
use proxy::{cmd_proxy_clear_used, cmd_proxy_next, cmd_proxy_refresh, cmd_proxy_status};
use sanitize::cmd_sanitize;
use schema::cmd_schema;

#[derive(Parser)]
#[command(name = "listscrape")]
#[command(about = "Scrape listing pages into clean markdown, with proxy rotation")]
#[command(version)]
pub struct Cli {
    /// Data directory
    #[arg(long, global = true, env = "LISTSCRAPE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to <data-dir>/listscrape.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a page and write its markdown to disk
    Crawl(CrawlArgs),

    /// Clean Google Maps markdown from a file or stdin
    Sanitize {
        /// Input file (stdin if omitted or "-")
        input: Option<PathBuf>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage the proxy pool
    Proxy {
        #[command(subcommand)]
        command: ProxyCommands,
    },

    /// Print the company extraction schema and instruction as JSON
    Schema,
}

#[derive(Args)]
pub(crate) struct CrawlArgs {
    /// URL to crawl
    pub url: String,
    /// Only convert elements matching this CSS selector
    #[arg(short, long)]
    pub selector: Option<String>,
    /// Proxy URL to crawl through
    #[arg(long, conflicts_with = "rotate_proxy")]
    pub proxy: Option<String>,
    /// Take the next proxy from the pool
    #[arg(long)]
    pub rotate_proxy: bool,
    /// Serve from and store to the page cache
    #[arg(long)]
    pub cache: bool,
    /// Skip the Google Maps cleanup (write raw markdown only)
    #[arg(long)]
    pub raw: bool,
    /// Output file (defaults to <output-dir>/<host>-<timestamp>.md)
    #[arg(short, long, conflicts_with = "stdout")]
    pub output: Option<PathBuf>,
    /// Print markdown to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Subcommand)]
enum ProxyCommands {
    /// Take the next unused proxy and print it as an http:// URL
    Next,
    /// Re-scrape the proxy sources and reset the used log
    Refresh,
    /// Delete the used-proxy log
    ClearUsed,
    /// Show pool sizes
    Status,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.data_dir, cli.config.as_deref())?;

    match cli.command {
        Commands::Crawl(args) => cmd_crawl(&settings, args, cli.verbose).await,
        Commands::Sanitize { input, output } => cmd_sanitize(input.as_deref(), output.as_deref()),
        Commands::Proxy { command } => match command {
            ProxyCommands::Next => cmd_proxy_next(&settings).await,
            ProxyCommands::Refresh => cmd_proxy_refresh(&settings).await,
            ProxyCommands::ClearUsed => cmd_proxy_clear_used(&settings),
            ProxyCommands::Status => cmd_proxy_status(&settings),
        },
        Commands::Schema => cmd_schema(),
    }
}
