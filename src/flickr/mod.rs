// Flickr API access — paginated photo search and rate-limit handling.
//
// `traits` defines the page-source contract the pipeline consumes. The
// REST client is the production implementation; tests plug in fakes.

pub mod client;
pub mod photos;
pub mod rate_limit;
pub mod traits;
