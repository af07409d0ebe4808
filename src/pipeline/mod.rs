// Scrape pipeline — the stages between the Flickr API and the map.
//
// filter and extract are pure per-record functions, accumulator holds the
// run's state, and scrape wires them to a page source and a renderer.

pub mod accumulator;
pub mod extract;
pub mod filter;
pub mod scrape;
