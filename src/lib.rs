// tagmap: pin recent hashtagged Flickr photos on a live browser map.
//
// This is the library root. Each module corresponds to one stage of the
// fetch -> filter -> extract -> accumulate -> render pipeline.

pub mod config;
pub mod error;
pub mod flickr;
pub mod map;
pub mod models;
pub mod output;
pub mod pipeline;
