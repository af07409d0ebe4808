// Hashtag filter — exact, case-insensitive tag membership.
//
// Flickr's text search matches titles and descriptions too, so a page can
// contain photos that merely mention the word. Only photos actually tagged
// with the hashtag are kept.

use crate::flickr::photos::RawPhoto;
use crate::models::normalize_hashtag;

/// Normalize one tag the same way hashtags are normalized.
pub fn normalize_tag(tag: &str) -> String {
    normalize_hashtag(tag)
}

/// True iff the record carries `hashtag` (already normalized) as a tag.
///
/// Records without a tag field never match.
pub fn matches(record: &RawPhoto, hashtag: &str) -> bool {
    record
        .tags
        .as_ref()
        .is_some_and(|tags| tags.iter().any(|t| normalize_tag(t) == hashtag))
}

/// Keep only the records tagged with `hashtag`, preserving order.
pub fn filter_records(records: Vec<RawPhoto>, hashtag: &str) -> Vec<RawPhoto> {
    records.into_iter().filter(|r| matches(r, hashtag)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tags: &[&str]) -> RawPhoto {
        RawPhoto::new("1", tags, 10.0, 20.0)
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert!(matches(&tagged(&["BLABLA", "x"]), "blabla"));
    }

    #[test]
    fn test_match_is_exact_not_substring() {
        assert!(!matches(&tagged(&["blablah"]), "blabla"));
        assert!(!matches(&tagged(&["bla"]), "blabla"));
    }

    #[test]
    fn test_match_ignores_hash_prefix_on_tags() {
        assert!(matches(&tagged(&["#Nice"]), "nice"));
    }

    #[test]
    fn test_missing_tags_never_match() {
        let mut record = tagged(&[]);
        record.tags = None;
        assert!(!matches(&record, "nice"));
        assert!(!matches(&tagged(&[]), "nice"));
    }

    #[test]
    fn test_filter_records_keeps_order() {
        let records = vec![
            RawPhoto::new("a", &["nice"], 1.0, 1.0),
            RawPhoto::new("b", &["other"], 1.0, 1.0),
            RawPhoto::new("c", &["sunset", "NICE"], 1.0, 1.0),
        ];
        let kept: Vec<String> = filter_records(records, "nice")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(kept, vec!["a", "c"]);
    }
}
