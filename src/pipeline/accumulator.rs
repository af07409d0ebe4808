// Result accumulator — dedup, limit, and the refresh schedule.
//
// Paginated search results can repeat a photo across a page boundary when
// new uploads shift the listing between requests, so acceptance is keyed
// on photo id and idempotent.

use std::collections::HashSet;
use std::num::NonZeroUsize;

use crate::models::GeoPoint;

/// Accumulated state of one scrape run.
///
/// Invariant: `seen_ids.len() == points.len()`.
#[derive(Debug)]
pub struct Accumulator {
    seen_ids: HashSet<String>,
    points: Vec<GeoPoint>,
    processed: usize,
    limit: Option<NonZeroUsize>,
    refresh_after: NonZeroUsize,
    /// `processed / refresh_after` at the last refresh handed out.
    refresh_boundary: usize,
}

impl Accumulator {
    pub fn new(limit: Option<NonZeroUsize>, refresh_after: NonZeroUsize) -> Self {
        Self {
            seen_ids: HashSet::new(),
            points: Vec::new(),
            processed: 0,
            limit,
            refresh_after,
            refresh_boundary: 0,
        }
    }

    /// Add a point unless its id was already accepted. Returns whether it
    /// was added.
    pub fn accept(&mut self, point: GeoPoint) -> bool {
        if self.seen_ids.contains(&point.id) {
            return false;
        }
        self.seen_ids.insert(point.id.clone());
        self.points.push(point);
        true
    }

    /// Count one processed record toward the refresh threshold.
    pub fn count_processed(&mut self) {
        self.processed += 1;
    }

    pub fn limit_reached(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.points.len() >= limit.get())
    }

    /// Whether a refresh boundary was crossed since the last refresh taken.
    ///
    /// Consumes the pending refresh: at most one refresh per call no matter
    /// how many boundaries were crossed since.
    pub fn take_refresh_due(&mut self) -> bool {
        let boundary = self.processed / self.refresh_after.get();
        if boundary > self.refresh_boundary {
            self.refresh_boundary = boundary;
            true
        } else {
            false
        }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str) -> GeoPoint {
        GeoPoint {
            id: id.to_string(),
            lat: 1.0,
            lon: 2.0,
            timestamp: None,
            title: String::new(),
        }
    }

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_accept_is_idempotent_per_id() {
        let mut acc = Accumulator::new(None, nz(1));
        assert!(acc.accept(point("a")));
        assert!(!acc.accept(point("a")));
        assert!(acc.accept(point("b")));
        assert!(!acc.accept(point("b")));
        assert_eq!(acc.len(), 2);
        assert_eq!(acc.seen_ids.len(), acc.points.len());
    }

    #[test]
    fn test_duplicate_keeps_first_occurrence() {
        let mut acc = Accumulator::new(None, nz(1));
        let mut first = point("a");
        first.title = "first".into();
        let mut second = point("a");
        second.title = "second".into();
        acc.accept(first);
        acc.accept(second);
        assert_eq!(acc.points()[0].title, "first");
    }

    #[test]
    fn test_limit_reached() {
        let mut acc = Accumulator::new(Some(nz(2)), nz(1));
        assert!(!acc.limit_reached());
        acc.accept(point("a"));
        assert!(!acc.limit_reached());
        acc.accept(point("b"));
        assert!(acc.limit_reached());
    }

    #[test]
    fn test_unbounded_never_reaches_limit() {
        let mut acc = Accumulator::new(None, nz(1));
        for i in 0..1000 {
            acc.accept(point(&i.to_string()));
        }
        assert!(!acc.limit_reached());
    }

    #[test]
    fn test_processed_counts_independently_of_points() {
        let mut acc = Accumulator::new(None, nz(10));
        acc.count_processed();
        acc.count_processed();
        acc.accept(point("a"));
        assert_eq!(acc.processed(), 2);
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_refresh_due_once_per_boundary() {
        let mut acc = Accumulator::new(None, nz(50));
        for _ in 0..40 {
            acc.count_processed();
        }
        assert!(!acc.take_refresh_due());

        for _ in 0..40 {
            acc.count_processed();
        }
        assert!(acc.take_refresh_due());
        // Already taken for the 50 boundary
        assert!(!acc.take_refresh_due());

        for _ in 0..20 {
            acc.count_processed();
        }
        assert!(acc.take_refresh_due());
    }

    #[test]
    fn test_refresh_due_collapses_multiple_boundaries() {
        let mut acc = Accumulator::new(None, nz(1));
        for _ in 0..5 {
            acc.count_processed();
        }
        assert!(acc.take_refresh_due());
        assert!(!acc.take_refresh_due());
    }

    #[test]
    fn test_no_refresh_before_anything_processed() {
        let mut acc = Accumulator::new(None, nz(1));
        assert!(!acc.take_refresh_due());
    }
}
