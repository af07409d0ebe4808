// Page source trait — the seam between the pipeline and the upstream API.
//
// The pipeline only ever asks for "the page after this cursor". Anything
// that can answer that (the Flickr REST client, an in-memory fake in tests)
// can drive a scrape.

use async_trait::async_trait;

use super::photos::RawPhoto;
use crate::error::FetchError;

/// Pagination cursor. For Flickr this is the 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(pub u64);

/// One page of raw search results.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<RawPhoto>,
    /// Cursor for the following page, `None` when the source is exhausted.
    pub next: Option<Cursor>,
    /// Total matches the upstream claims to have, if it says.
    pub total: Option<u64>,
}

/// A paginated source of candidate photo records.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Fetch the page at `cursor` (`None` for the first page).
    ///
    /// Implementations handle transient rate limiting themselves; callers
    /// only ever see `RequestFailed`, `AuthFailed` or `MalformedResponse`.
    async fn fetch_page(&self, hashtag: &str, cursor: Option<Cursor>) -> Result<Page, FetchError>;
}
