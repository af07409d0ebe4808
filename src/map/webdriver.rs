// W3C WebDriver client — drives chromedriver/geckodriver over HTTP.
//
// Only the handful of endpoints the map needs: create a session, navigate,
// run a script, delete the session. Every response is a `{"value": ...}`
// envelope; failures carry `value.error` and `value.message`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::traits::{BrowserLauncher, BrowserSession};
use crate::error::DriverError;
use crate::models::GeoPoint;

/// Default chromedriver endpoint.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Launches browser sessions on a WebDriver server.
pub struct WebDriverLauncher {
    client: reqwest::Client,
    base_url: String,
    browser: String,
    headless: bool,
}

impl WebDriverLauncher {
    /// `browser` is the W3C `browserName` ("chrome", "firefox", ...).
    pub fn new(base_url: &str, browser: &str, headless: bool) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build WebDriver HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            browser: browser.to_string(),
            headless,
        })
    }

    /// The `POST /session` body for this launcher's browser.
    pub fn capabilities(&self) -> Value {
        let mut always_match = json!({ "browserName": self.browser });
        if self.headless {
            match self.browser.as_str() {
                "chrome" | "chromium" => {
                    always_match["goog:chromeOptions"] = json!({ "args": ["--headless=new"] });
                }
                "firefox" => {
                    always_match["moz:firefoxOptions"] = json!({ "args": ["-headless"] });
                }
                "MicrosoftEdge" | "msedge" => {
                    always_match["ms:edgeOptions"] = json!({ "args": ["--headless=new"] });
                }
                _ => {}
            }
        }
        json!({ "capabilities": { "alwaysMatch": always_match } })
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self, url: &str) -> Result<Box<dyn BrowserSession>, DriverError> {
        let value = command(
            &self.client,
            Method::POST,
            &format!("{}/session", self.base_url),
            Some(self.capabilities()),
        )
        .await?;

        let created: NewSession = serde_json::from_value(value).map_err(|e| {
            DriverError::Network(format!("unexpected new-session response: {e}"))
        })?;

        info!(session_id = %created.session_id, browser = %self.browser, "Browser session started");

        let session = WebDriverSession {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.base_url, created.session_id),
        };

        // Don't leak the browser if navigation fails.
        if let Err(e) = session.navigate(url).await {
            let _ = Box::new(session).quit().await;
            return Err(e);
        }

        Ok(Box::new(session))
    }
}

/// One live WebDriver session.
pub struct WebDriverSession {
    client: reqwest::Client,
    session_url: String,
}

impl WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        command(
            &self.client,
            Method::POST,
            &format!("{}/url", self.session_url),
            Some(json!({ "url": url })),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn add_markers(&mut self, points: &[GeoPoint]) -> Result<(), DriverError> {
        let body = json!({
            "script": "return window.tagmapAddMarkers(arguments[0]);",
            "args": [points],
        });
        let count = command(
            &self.client,
            Method::POST,
            &format!("{}/execute/sync", self.session_url),
            Some(body),
        )
        .await?;

        debug!(added = points.len(), on_page = %count, "Markers pushed to browser");
        Ok(())
    }

    async fn quit(self: Box<Self>) -> Result<(), DriverError> {
        command(&self.client, Method::DELETE, &self.session_url, None).await?;
        info!("Browser session closed");
        Ok(())
    }
}

#[derive(Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    value: Value,
}

/// Send one WebDriver command and unwrap the `value` of its response.
async fn command(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, DriverError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<Envelope>(&body) {
        Ok(envelope) if status.is_success() => Ok(envelope.value),
        Ok(envelope) => Err(error_from_value(status.as_u16(), &envelope.value)),
        Err(e) if status.is_success() => Err(DriverError::Network(format!(
            "undecodable response from {url}: {e}"
        ))),
        // Proxies and misrouted Grid URLs answer with plain text or HTML.
        Err(_) => Err(DriverError::WebDriver {
            status: status.as_u16(),
            error: "unknown error".to_string(),
            message: body.trim().to_string(),
        }),
    }
}

/// Build a `DriverError` from a WebDriver error `value`.
pub fn error_from_value(status: u16, value: &Value) -> DriverError {
    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    DriverError::WebDriver {
        status,
        error: field("error"),
        message: field("message"),
    }
}
