// Map document — the Leaflet HTML page the browser shows.
//
// Two files live side by side: the live page the browser session loads
// (an empty map that markers get pushed into), and the saved map, a
// standalone page with every point baked in that survives the run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::models::GeoPoint;

/// File name of the live page, placed next to the saved map.
const LIVE_FILE_NAME: &str = "tagmap-live.html";

/// Initial view, roughly centered on Europe/Africa.
const START_LAT: f64 = 30.0;
const START_LON: f64 = 10.0;
const START_ZOOM: u8 = 3;

/// Locations of the live and saved map files.
#[derive(Debug, Clone)]
pub struct MapDocument {
    path: PathBuf,
}

impl MapDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the saved map.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the live page the browser loads.
    pub fn live_path(&self) -> PathBuf {
        self.path
            .parent()
            .map(|dir| dir.join(LIVE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(LIVE_FILE_NAME))
    }

    /// Write the empty live page and return its `file://` URL.
    pub fn write_live(&self) -> io::Result<String> {
        let live = self.live_path();
        write_file(&live, &render_html(&[]))?;
        file_url(&live)
    }

    /// Write the saved map with every point in `points`.
    pub fn save(&self, points: &[GeoPoint]) -> io::Result<()> {
        write_file(&self.path, &render_html(points))
    }
}

fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    fs::write(path, contents)
}

fn file_url(path: &Path) -> io::Result<String> {
    let absolute = fs::canonicalize(path)?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot build a file URL for {}", absolute.display()),
            )
        })
}

/// Serialize points for embedding inside a `<script>` block.
fn points_json(points: &[GeoPoint]) -> String {
    // serde_json never fails on GeoPoint; fall back to an empty list anyway.
    serde_json::to_string(points)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/")
}

/// Render the full Leaflet page with `points` pinned.
///
/// The page exposes `window.tagmapAddMarkers(points)` so a browser session
/// can push more markers in without reloading.
pub fn render_html(points: &[GeoPoint]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>tagmap</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map('map').setView([{START_LAT}, {START_LON}], {START_ZOOM});
L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
  attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);
window.tagmapMarkerCount = 0;
window.tagmapAddMarkers = function (points) {{
  points.forEach(function (p) {{
    var popup = document.createElement('span');
    popup.textContent = p.title;
    L.marker([p.lat, p.lon]).bindPopup(popup).addTo(map);
    window.tagmapMarkerCount += 1;
  }});
  return window.tagmapMarkerCount;
}};
window.tagmapAddMarkers({points});
</script>
</body>
</html>
"#,
        points = points_json(points),
    )
}
