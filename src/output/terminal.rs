// Colored terminal output for scrape results.
//
// main.rs delegates here so the wording of normal versus abnormal
// termination lives in one place.

use std::path::Path;

use colored::Colorize;

use super::truncate_chars;
use crate::error::{FetchError, ScrapeError};
use crate::pipeline::scrape::{ScrapeReport, Termination};

/// How many of the most recent pins to list in the summary.
const RECENT_PINS: usize = 5;

/// One-line, uncolored description of why a run stopped.
pub fn termination_message(report: &ScrapeReport) -> String {
    match report.termination {
        Termination::LimitReached => format!(
            "Limit of {} reached. Stopped processing photos.",
            report.points.len()
        ),
        Termination::SourceExhausted => "No more results.".to_string(),
        Termination::Cancelled => "Cancelled. Map saved with the photos pinned so far.".to_string(),
    }
}

/// One-line, uncolored description of a failed run.
pub fn failure_message(err: &ScrapeError) -> String {
    match err {
        ScrapeError::Fetch(FetchError::AuthFailed(msg)) => {
            format!("Authentication failed: {msg}. Check FLICKR_API_KEY.")
        }
        ScrapeError::Fetch(FetchError::RequestFailed(msg)) => format!("Request failed: {msg}"),
        ScrapeError::Fetch(e) => format!("Request failed: {e}"),
        ScrapeError::Driver(e) => format!("Browser failed: {e}"),
        ScrapeError::InvalidRequest(msg) => format!("Invalid request: {msg}"),
    }
}

/// Print the summary of a successful run.
pub fn display_summary(report: &ScrapeReport, hashtag: &str, map_path: &Path) {
    println!("\n{}", format!("=== #{hashtag} ===").bold());
    println!("  {}", termination_message(report).green());
    println!();
    println!("  Pages fetched:     {}", report.pages);
    println!("  Photos processed:  {}", report.processed);
    println!("  Photos pinned:     {}", report.points.len());
    println!("  Map refreshes:     {}", report.refreshes);
    println!("  Map saved to:      {}", map_path.display());

    if report.points.is_empty() {
        println!(
            "\n  {}",
            format!("No geotagged photos tagged #{hashtag} were found.").yellow()
        );
        return;
    }

    println!("\n  {}", "Most recent pins:".dimmed());
    for point in report.points.iter().take(RECENT_PINS) {
        let title = if point.title.is_empty() {
            "(untitled)".to_string()
        } else {
            truncate_chars(&point.title, 50)
        };
        println!(
            "    {:<52} {:>9.4}, {:>9.4}",
            title,
            point.lat,
            point.lon,
        );
    }
}

/// Print a failed run to stderr.
pub fn display_failure(err: &ScrapeError, map_path: &Path) {
    eprintln!("\n{} {}", "Error:".red().bold(), failure_message(err).red());
    eprintln!(
        "  {}",
        format!("Photos pinned before the failure were saved to {}", map_path.display()).dimmed()
    );
}
