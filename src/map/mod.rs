// Map rendering — a Leaflet page driven through a browser session.
//
// The renderer owns the one browser session of a run and periodically
// throws it away and starts a fresh one, because a long-lived session grows
// with every marker added to it.

pub mod document;
pub mod renderer;
pub mod traits;
pub mod webdriver;
