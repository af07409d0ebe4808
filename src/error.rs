// Error taxonomy for the library modules.
//
// `main` wraps these in anyhow at the application boundary. Inside the
// library they stay typed so the pipeline can tell a retryable rate limit
// from a fatal auth failure.

use thiserror::Error;

/// Failures from fetching a page of search results.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream throttled us. Retried inside `with_retry`, never surfaces
    /// past it.
    #[error("rate limited by upstream API")]
    RateLimited,

    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Bad or missing API key. Aborts immediately, never retried.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("malformed API response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::RequestFailed(err.to_string())
    }
}

/// Failures talking to the browser automation driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("WebDriver network error: {0}")]
    Network(String),

    #[error("WebDriver error (status {status}, {error}): {message}")]
    WebDriver {
        status: u16,
        error: String,
        message: String,
    },

    #[error("failed to write map document: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for DriverError {
    fn from(err: reqwest::Error) -> Self {
        DriverError::Network(err.to_string())
    }
}

/// Anything that ends a scrape abnormally.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("map rendering failed: {0}")]
    Driver(#[from] DriverError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limited_is_retryable() {
        assert!(FetchError::RateLimited.is_retryable());
        assert!(!FetchError::RequestFailed("boom".into()).is_retryable());
        assert!(!FetchError::AuthFailed("bad key".into()).is_retryable());
        assert!(!FetchError::MalformedResponse("{".into()).is_retryable());
    }

    #[test]
    fn test_scrape_error_messages_distinguish_causes() {
        let auth: ScrapeError = FetchError::AuthFailed("Invalid API Key".into()).into();
        assert_eq!(auth.to_string(), "authentication failed: Invalid API Key");

        let failed: ScrapeError = FetchError::RequestFailed("HTTP 500".into()).into();
        assert_eq!(failed.to_string(), "request failed: HTTP 500");
    }
}
