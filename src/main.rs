use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing::{info, warn};

use tagmap::config::Config;
use tagmap::flickr::client::FlickrClient;
use tagmap::map::document::MapDocument;
use tagmap::map::renderer::MapRenderer;
use tagmap::map::webdriver::WebDriverLauncher;
use tagmap::models::{RefreshBasis, SearchRequest};
use tagmap::output::terminal;
use tagmap::pipeline::scrape;

/// tagmap: pin recent hashtagged Flickr photos on a live map.
///
/// Searches Flickr for the most recent uploads tagged with a hashtag and
/// drops a marker for each geotagged one on a map shown in your browser.
#[derive(Parser)]
#[command(name = "tagmap", version, about)]
struct Cli {
    /// Hashtag to look for. The leading '#' is optional.
    #[arg(long, short = 't')]
    hashtag: String,

    /// How many photos to pin. Reads every result when omitted.
    #[arg(long, short = 'l', value_parser = positive_count())]
    limit: Option<usize>,

    /// Restart the browser after this many processed photos (checked once per page).
    /// The default of 1 refreshes after every page.
    #[arg(long, short = 'r', default_value = "1", value_parser = positive_count())]
    refresh_map_after: usize,

    /// Which photos count toward --refresh-map-after
    #[arg(long, value_enum, default_value_t = RefreshCounts::Matched)]
    refresh_counts: RefreshCounts,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Open the saved map in your default browser when done
    #[arg(long)]
    open: bool,

    /// Where to save the map (overrides TAGMAP_MAP_PATH)
    #[arg(long)]
    map_path: Option<PathBuf>,
}

/// Parses a count of at least 1 that fits this platform's `usize`.
fn positive_count() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::<usize>::new().range(1..)
}

#[derive(Clone, Copy, ValueEnum)]
enum RefreshCounts {
    /// Photos tagged with the hashtag
    Matched,
    /// Every photo returned by the search
    Inspected,
}

impl From<RefreshCounts> for RefreshBasis {
    fn from(value: RefreshCounts) -> Self {
        match value {
            RefreshCounts::Matched => RefreshBasis::Matched,
            RefreshCounts::Inspected => RefreshBasis::Inspected,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tagmap=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load()?;
    config.require_flickr()?;

    let request = SearchRequest::new(&cli.hashtag, cli.limit, cli.refresh_map_after)?
        .with_refresh_basis(cli.refresh_counts.into());

    info!(
        hashtag = %request.hashtag,
        limit = ?request.limit,
        refresh_after = request.refresh_after.get(),
        "Hashtag inserted"
    );

    let map_path = cli.map_path.unwrap_or_else(|| config.map_path.clone());

    let client = FlickrClient::new(
        &config.flickr_api_url,
        &config.flickr_api_key,
        config.per_page,
    )?;
    let launcher = WebDriverLauncher::new(&config.webdriver_url, &config.browser, cli.headless)?;
    let mut renderer = MapRenderer::new(launcher, MapDocument::new(map_path.clone()));

    // First Ctrl-C stops the scrape at the next page boundary, a second one
    // exits right away.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if cancel.swap(true, Ordering::SeqCst) {
                    eprintln!("Interrupted again, exiting without saving the map");
                    std::process::exit(130);
                }
                warn!("Interrupt received, stopping after the current page (Ctrl-C again to quit)");
            }
        });
    }

    println!("Searching Flickr for #{}...", request.hashtag);

    let exit = match scrape::run(&client, &mut renderer, &request, &cancel).await {
        Ok(report) => {
            terminal::display_summary(&report, &request.hashtag, &map_path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            terminal::display_failure(&e, &map_path);
            ExitCode::FAILURE
        }
    };

    if cli.open {
        open::that(&map_path)
            .with_context(|| format!("Failed to open {}", map_path.display()))
            .unwrap_or_else(|e| {
                warn!(error = %e, "Could not open saved map");
                println!("  {} {}", "Warning:".yellow(), e);
            });
    }

    Ok(exit)
}
