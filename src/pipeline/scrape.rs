// Scrape pipeline: page by page, fetch -> filter -> extract -> accumulate
// -> render, until the limit is hit, the source runs dry, or the user
// cancels.
//
// Everything runs sequentially on one task. Cancellation is only checked
// between pages. The renderer is closed on every exit path, fatal errors
// included, and whatever was rendered stays in the saved map.

use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use super::accumulator::Accumulator;
use super::extract::{extract, Extracted};
use super::filter::matches;
use crate::error::{DriverError, ScrapeError};
use crate::flickr::traits::{Cursor, PhotoSource};
use crate::map::renderer::MapRenderer;
use crate::map::traits::BrowserLauncher;
use crate::models::{GeoPoint, RefreshBasis, SearchRequest};

/// Why a scrape stopped normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The requested number of points was collected.
    LimitReached,
    /// The upstream API had no further pages.
    SourceExhausted,
    /// Stopped between pages on user request.
    Cancelled,
}

/// Outcome of a completed scrape.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub termination: Termination,
    pub points: Vec<GeoPoint>,
    /// Records counted toward the refresh threshold.
    pub processed: usize,
    /// Browser session restarts.
    pub refreshes: usize,
    /// Pages fetched from the source.
    pub pages: usize,
}

/// Run a scrape for `request` and always close the renderer afterwards.
///
/// `cancel` is polled once per page; set it to stop after the current page.
pub async fn run<S, L>(
    source: &S,
    renderer: &mut MapRenderer<L>,
    request: &SearchRequest,
    cancel: &AtomicBool,
) -> Result<ScrapeReport, ScrapeError>
where
    S: PhotoSource + ?Sized,
    L: BrowserLauncher,
{
    let mut acc = Accumulator::new(request.limit, request.refresh_after);
    let progress = progress_bar(request);

    let outcome = drive(source, renderer, request, cancel, &mut acc, &progress).await;
    progress.finish_and_clear();

    let closed = renderer.close(acc.points()).await;

    let (termination, pages) = match outcome {
        Ok(done) => done,
        Err(e) => {
            if let Err(close_err) = closed {
                warn!(error = %close_err, "Failed to close browser session after error");
            }
            warn!(error = %e, points = acc.len(), "Scrape aborted");
            return Err(e);
        }
    };
    match closed {
        Ok(()) => {}
        // The map itself couldn't be written.
        Err(e @ DriverError::Io(_)) => return Err(e.into()),
        Err(e) => warn!(error = %e, "Failed to quit browser session, map was saved"),
    }

    info!(
        termination = ?termination,
        points = acc.len(),
        processed = acc.processed(),
        refreshes = renderer.refresh_count(),
        pages = pages,
        "Scrape finished"
    );

    Ok(ScrapeReport {
        termination,
        processed: acc.processed(),
        refreshes: renderer.refresh_count(),
        pages,
        points: acc.into_points(),
    })
}

/// The page loop. Returns the termination reason and page count.
async fn drive<S, L>(
    source: &S,
    renderer: &mut MapRenderer<L>,
    request: &SearchRequest,
    cancel: &AtomicBool,
    acc: &mut Accumulator,
    progress: &ProgressBar,
) -> Result<(Termination, usize), ScrapeError>
where
    S: PhotoSource + ?Sized,
    L: BrowserLauncher,
{
    let mut cursor: Option<Cursor> = None;
    let mut pages = 0usize;

    loop {
        if cancel.load(Ordering::SeqCst) {
            info!(pages, "Cancelled, stopping before next page");
            return Ok((Termination::Cancelled, pages));
        }

        let page = source.fetch_page(&request.hashtag, cursor).await?;
        pages += 1;

        if pages == 1 {
            match page.total {
                Some(total) => {
                    info!(total, hashtag = %request.hashtag, "Starting to process results")
                }
                None => info!(hashtag = %request.hashtag, "Starting to process results"),
            }
        }

        let fetched = page.records.len();
        let before = acc.len();

        for record in &page.records {
            if request.refresh_basis == RefreshBasis::Inspected {
                acc.count_processed();
            }
            if !matches(record, &request.hashtag) {
                continue;
            }
            if request.refresh_basis == RefreshBasis::Matched {
                acc.count_processed();
            }

            if let Extracted::Point(point) = extract(record) {
                if acc.accept(point) {
                    progress.inc(1);
                }
            }

            if acc.limit_reached() {
                break;
            }
        }

        debug!(
            page = pages,
            fetched,
            accepted = acc.len() - before,
            processed = acc.processed(),
            "Processed page"
        );

        if acc.take_refresh_due() {
            renderer.refresh(acc.points()).await?;
        } else {
            renderer.render(&acc.points()[before..]).await?;
        }

        info!(page = pages, points = acc.len(), "Number of photos processed");

        if acc.limit_reached() {
            info!(limit = acc.len(), "Limit reached, stopping");
            return Ok((Termination::LimitReached, pages));
        }

        match page.next {
            Some(next) => cursor = Some(next),
            None => return Ok((Termination::SourceExhausted, pages)),
        }
    }
}

fn progress_bar(request: &SearchRequest) -> ProgressBar {
    match request.limit {
        Some(limit) => {
            let pb = ProgressBar::new(limit.get() as u64);
            if let Ok(style) =
                ProgressStyle::default_bar().template("  Pinned [{bar:30}] {pos}/{len}")
            {
                pb.set_style(style);
            }
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) =
                ProgressStyle::default_spinner().template("  {spinner} Pinned {pos}")
            {
                pb.set_style(style);
            }
            pb
        }
    }
}
