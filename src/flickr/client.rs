// Flickr REST client — paginated `flickr.photos.search` over HTTP.
//
// Only public search is used, so an API key is all the auth there is. The
// client classifies every failure into the FetchError taxonomy so the
// pipeline can tell throttling (retry) from a bad key (abort).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::photos::SearchResponse;
use super::rate_limit::{with_retry, RateLimiter};
use super::traits::{Cursor, Page, PhotoSource};
use crate::error::FetchError;

/// Default Flickr REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.flickr.com/services/rest";

/// Flickr's maximum page size for `flickr.photos.search`.
pub const MAX_PER_PAGE: u32 = 500;

/// Per-request deadline, so a stalled connection surfaces as `RequestFailed`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Flickr error codes meaning the key or login is unusable.
const AUTH_ERROR_CODES: [i64; 3] = [98, 99, 100];

/// Flickr error codes meaning "try again later".
const THROTTLE_ERROR_CODES: [i64; 2] = [105, 106];

/// HTTP client for Flickr photo search.
pub struct FlickrClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    per_page: u32,
    rate_limiter: RateLimiter,
}

impl FlickrClient {
    /// Create a new client. `per_page` is clamped to Flickr's 1..=500.
    pub fn new(base_url: &str, api_key: &str, per_page: u32) -> Result<Self> {
        Self::with_timeout(base_url, api_key, per_page, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        api_key: &str,
        per_page: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("tagmap/0.1 (hashtag photo map)")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            rate_limiter: RateLimiter::flickr_default(),
        })
    }

    /// Run a single search request for one page, without retries.
    ///
    /// Photos are requested newest-first with geo, tags and upload date
    /// extras, restricted to geotagged uploads.
    pub async fn search_page(&self, text: &str, page: u64) -> Result<Page, FetchError> {
        let page_param = page.to_string();
        let per_page = self.per_page.to_string();
        let params: [(&str, &str); 10] = [
            ("method", "flickr.photos.search"),
            ("api_key", &self.api_key),
            ("format", "json"),
            ("nojsoncallback", "1"),
            ("text", text),
            ("extras", "geo,tags,date_upload"),
            ("has_geo", "1"),
            ("sort", "date-posted-desc"),
            ("per_page", &per_page),
            ("page", &page_param),
        ];

        debug!(text = text, page = page, "Flickr search request");

        let response = self.client.get(&self.base_url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_status(status, &body));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        page_from_response(body)
    }
}

#[async_trait]
impl PhotoSource for FlickrClient {
    async fn fetch_page(&self, hashtag: &str, cursor: Option<Cursor>) -> Result<Page, FetchError> {
        let page = cursor.map(|c| c.0).unwrap_or(1);
        with_retry(&self.rate_limiter, || self.search_page(hashtag, page)).await
    }
}

/// Map a non-2xx HTTP status onto the fetch error taxonomy.
pub fn classify_http_status(status: StatusCode, body: &str) -> FetchError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FetchError::AuthFailed(format!("HTTP {status}: {body}"))
        }
        _ => FetchError::RequestFailed(format!("HTTP {status}: {body}")),
    }
}

/// Map a Flickr `stat: "fail"` payload onto the fetch error taxonomy.
pub fn classify_api_failure(code: Option<i64>, message: &str) -> FetchError {
    match code {
        Some(c) if AUTH_ERROR_CODES.contains(&c) => FetchError::AuthFailed(message.to_string()),
        Some(c) if THROTTLE_ERROR_CODES.contains(&c) => FetchError::RateLimited,
        Some(c) => FetchError::RequestFailed(format!("Flickr error {c}: {message}")),
        None => FetchError::RequestFailed(message.to_string()),
    }
}

/// The cursor for the page after `page`, or `None` when this was the last one.
pub fn next_cursor(page: u64, pages: u64, returned: usize) -> Option<Cursor> {
    if returned == 0 || page >= pages {
        None
    } else {
        Some(Cursor(page + 1))
    }
}

/// Turn a decoded search envelope into a `Page`, or the error it reports.
pub fn page_from_response(body: SearchResponse) -> Result<Page, FetchError> {
    if body.stat != "ok" {
        let message = body.message.unwrap_or_else(|| "unknown error".to_string());
        return Err(classify_api_failure(body.code, &message));
    }

    let photos = body.photos.ok_or_else(|| {
        FetchError::MalformedResponse("response has stat=ok but no photos".to_string())
    })?;

    let returned = photos.photo.len();
    let next = next_cursor(photos.page, photos.pages, returned);
    let total = photos.total;
    let records = photos.into_records();

    debug!(
        returned = returned,
        decoded = records.len(),
        has_next = next.is_some(),
        "Decoded Flickr search page"
    );

    Ok(Page {
        records,
        next,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stalled_connection_times_out_as_request_failed() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = FlickrClient::with_timeout(
            &format!("http://{addr}/services/rest"),
            "key",
            100,
            Duration::from_millis(200),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let err = client.fetch_page("nice", None).await.unwrap_err();
        assert!(matches!(err, FetchError::RequestFailed(_)), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_new_clamps_per_page() {
        let client = FlickrClient::new(DEFAULT_API_URL, "key", 10_000).unwrap();
        assert_eq!(client.per_page, MAX_PER_PAGE);
        let client = FlickrClient::new(DEFAULT_API_URL, "key", 0).unwrap();
        assert_eq!(client.per_page, 1);
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = FlickrClient::new("https://example.test/rest/", "key", 50).unwrap();
        assert_eq!(client.base_url, "https://example.test/rest");
    }

    #[test]
    fn test_classify_http_status() {
        assert!(matches!(
            classify_http_status(StatusCode::TOO_MANY_REQUESTS, ""),
            FetchError::RateLimited
        ));
        assert!(matches!(
            classify_http_status(StatusCode::FORBIDDEN, "nope"),
            FetchError::AuthFailed(_)
        ));
        assert!(matches!(
            classify_http_status(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            FetchError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_classify_api_failure_codes() {
        assert!(matches!(
            classify_api_failure(Some(100), "Invalid API Key (Key has invalid format)"),
            FetchError::AuthFailed(_)
        ));
        assert!(matches!(
            classify_api_failure(Some(105), "Service currently unavailable"),
            FetchError::RateLimited
        ));
        assert!(matches!(
            classify_api_failure(Some(3), "Parameterless searches have been disabled"),
            FetchError::RequestFailed(_)
        ));
        assert!(matches!(
            classify_api_failure(None, "??"),
            FetchError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_next_cursor() {
        assert_eq!(next_cursor(1, 3, 100), Some(Cursor(2)));
        assert_eq!(next_cursor(3, 3, 100), None);
        assert_eq!(next_cursor(1, 1, 10), None);
        // An empty page ends pagination even if Flickr claims more pages
        assert_eq!(next_cursor(2, 9, 0), None);
    }
}
