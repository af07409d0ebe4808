// Core data types shared across the pipeline.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

/// Which records count toward the map refresh threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshBasis {
    /// Only records whose tags matched the hashtag (default).
    #[default]
    Matched,
    /// Every record the pipeline looked at, matching or not.
    Inspected,
}

/// A validated scrape request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Normalized hashtag: no leading '#', lowercase, trimmed.
    pub hashtag: String,
    /// Stop paginating once this many points are accepted. `None` reads
    /// the whole result stream.
    pub limit: Option<NonZeroUsize>,
    /// Restart the browser session every time this many records are processed.
    pub refresh_after: NonZeroUsize,
    pub refresh_basis: RefreshBasis,
}

impl SearchRequest {
    /// Build a request from raw user input.
    ///
    /// Rejects an empty hashtag (after stripping '#'), a zero limit, and a
    /// zero refresh threshold.
    pub fn new(
        hashtag: &str,
        limit: Option<usize>,
        refresh_after: usize,
    ) -> Result<Self, ScrapeError> {
        let hashtag = normalize_hashtag(hashtag);
        if hashtag.is_empty() {
            return Err(ScrapeError::InvalidRequest(
                "hashtag is empty after removing '#'".to_string(),
            ));
        }

        let limit = match limit {
            None => None,
            Some(n) => Some(NonZeroUsize::new(n).ok_or_else(|| {
                ScrapeError::InvalidRequest("limit must be a positive integer".to_string())
            })?),
        };

        let refresh_after = NonZeroUsize::new(refresh_after).ok_or_else(|| {
            ScrapeError::InvalidRequest("refresh threshold must be a positive integer".to_string())
        })?;

        Ok(Self {
            hashtag,
            limit,
            refresh_after,
            refresh_basis: RefreshBasis::default(),
        })
    }

    pub fn with_refresh_basis(mut self, basis: RefreshBasis) -> Self {
        self.refresh_basis = basis;
        self
    }
}

/// Normalize a hashtag or tag for comparison: trim, strip any leading '#',
/// lowercase.
pub fn normalize_hashtag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').trim().to_lowercase()
}

/// One geotagged photo, ready to be pinned on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// Upload time as reported by Flickr, when parseable.
    pub timestamp: Option<DateTime<Utc>>,
    /// Photo title, shown as the marker popup.
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_strips_hash_and_lowercases() {
        let req = SearchRequest::new("  #Nice ", None, 1).unwrap();
        assert_eq!(req.hashtag, "nice");
        assert!(req.limit.is_none());
        assert_eq!(req.refresh_after.get(), 1);
        assert_eq!(req.refresh_basis, RefreshBasis::Matched);
    }

    #[test]
    fn test_new_strips_repeated_hashes() {
        let req = SearchRequest::new("##sunset", Some(5), 2).unwrap();
        assert_eq!(req.hashtag, "sunset");
        assert_eq!(req.limit.map(NonZeroUsize::get), Some(5));
    }

    #[test]
    fn test_new_rejects_empty_hashtag() {
        assert!(matches!(
            SearchRequest::new("#", None, 1),
            Err(ScrapeError::InvalidRequest(_))
        ));
        assert!(SearchRequest::new("   ", None, 1).is_err());
    }

    #[test]
    fn test_new_rejects_zero_limit_and_refresh() {
        assert!(SearchRequest::new("nice", Some(0), 1).is_err());
        assert!(SearchRequest::new("nice", None, 0).is_err());
    }

    #[test]
    fn test_with_refresh_basis() {
        let req = SearchRequest::new("nice", None, 1)
            .unwrap()
            .with_refresh_basis(RefreshBasis::Inspected);
        assert_eq!(req.refresh_basis, RefreshBasis::Inspected);
    }
}
