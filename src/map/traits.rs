// Browser traits — the seam between the renderer and a real browser.
//
// WebDriverLauncher implements these against chromedriver/geckodriver;
// tests use in-memory fakes that record the markers they were given.

use async_trait::async_trait;

use crate::error::DriverError;
use crate::models::GeoPoint;

/// Starts browser sessions pointed at a page.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Open a new browser session and navigate it to `url`.
    async fn launch(&self, url: &str) -> Result<Box<dyn BrowserSession>, DriverError>;
}

/// A live browser session showing the map page.
#[async_trait]
pub trait BrowserSession: Send {
    /// Pin the given points on the page.
    async fn add_markers(&mut self, points: &[GeoPoint]) -> Result<(), DriverError>;

    /// End the session and release the browser.
    async fn quit(self: Box<Self>) -> Result<(), DriverError>;
}
