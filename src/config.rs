use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::flickr::client::{DEFAULT_API_URL, MAX_PER_PAGE};
use crate::map::webdriver::DEFAULT_WEBDRIVER_URL;

/// Default location of the saved map, relative to the working directory.
pub const DEFAULT_MAP_PATH: &str = "./map/map.html";

/// Central configuration loaded from environment variables.
///
/// The API key comes from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    pub flickr_api_key: String,
    /// Flickr REST endpoint (defaults to https://api.flickr.com/services/rest).
    pub flickr_api_url: String,
    /// Results requested per search page, 1..=500.
    pub per_page: u32,
    /// WebDriver server (chromedriver by default on :9515).
    pub webdriver_url: String,
    /// W3C browserName to request from the WebDriver server.
    pub browser: String,
    pub map_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything except the API key has a default.
    pub fn load() -> Result<Self> {
        let per_page = match env::var("FLICKR_PER_PAGE") {
            Ok(raw) => parse_per_page(&raw)?,
            Err(_) => MAX_PER_PAGE,
        };

        Ok(Self {
            flickr_api_key: env::var("FLICKR_API_KEY").unwrap_or_default(),
            flickr_api_url: env::var("FLICKR_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            per_page,
            webdriver_url: env::var("WEBDRIVER_URL")
                .unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string()),
            browser: env::var("TAGMAP_BROWSER").unwrap_or_else(|_| "chrome".to_string()),
            map_path: env::var("TAGMAP_MAP_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MAP_PATH)),
        })
    }

    /// Check that the Flickr API key is configured.
    /// Call this before any operation that talks to Flickr.
    pub fn require_flickr(&self) -> Result<()> {
        if self.flickr_api_key.is_empty() {
            anyhow::bail!(
                "FLICKR_API_KEY not set. Add it to your .env file.\n\
                 Get a key at https://www.flickr.com/services/apps/create/"
            );
        }
        Ok(())
    }
}

/// Parse FLICKR_PER_PAGE, clamping to Flickr's allowed range.
fn parse_per_page(raw: &str) -> Result<u32> {
    let n: u32 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("FLICKR_PER_PAGE must be a positive integer, got {raw:?}"))?;
    Ok(n.clamp(1, MAX_PER_PAGE))
}
