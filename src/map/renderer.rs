// Map renderer — owns the browser session and its lifecycle.
//
//   Closed --render--> Open --render--> Open
//   Open --refresh--> (quit, relaunch, replay all points) --> Open
//   Open/Closed --close--> Closed
//
// Sessions open lazily on the first render or refresh. Refresh replays the
// whole point list, not just the latest page, so the map is complete after
// every restart.

use tracing::{info, warn};

use super::document::MapDocument;
use super::traits::{BrowserLauncher, BrowserSession};
use crate::error::DriverError;
use crate::models::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Closed,
    Open,
}

pub struct MapRenderer<L: BrowserLauncher> {
    launcher: L,
    document: MapDocument,
    session: Option<Box<dyn BrowserSession>>,
    refreshes: usize,
}

impl<L: BrowserLauncher> MapRenderer<L> {
    pub fn new(launcher: L, document: MapDocument) -> Self {
        Self {
            launcher,
            document,
            session: None,
            refreshes: 0,
        }
    }

    pub fn state(&self) -> RendererState {
        if self.session.is_some() {
            RendererState::Open
        } else {
            RendererState::Closed
        }
    }

    /// Number of session restarts so far.
    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    pub fn document(&self) -> &MapDocument {
        &self.document
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    async fn open(&mut self) -> Result<&mut Box<dyn BrowserSession>, DriverError> {
        if self.session.is_none() {
            let url = self.document.write_live()?;
            let session = self.launcher.launch(&url).await?;
            self.session = Some(session);
        }
        // Just set above if it was empty.
        self.session
            .as_mut()
            .ok_or_else(|| DriverError::Network("browser session unavailable".to_string()))
    }

    /// Add `new_points` to the current session, opening one if needed.
    pub async fn render(&mut self, new_points: &[GeoPoint]) -> Result<(), DriverError> {
        let session = self.open().await?;
        if !new_points.is_empty() {
            session.add_markers(new_points).await?;
        }
        Ok(())
    }

    /// Tear down the session, start a fresh one, and replay `all_points`.
    ///
    /// Also saves a snapshot of the map, so a crash mid-run still leaves
    /// everything rendered so far on disk.
    pub async fn refresh(&mut self, all_points: &[GeoPoint]) -> Result<(), DriverError> {
        if let Some(old) = self.session.take() {
            if let Err(e) = old.quit().await {
                warn!(error = %e, "Failed to quit browser session before refresh");
            }
        }

        self.document.save(all_points)?;
        self.refreshes += 1;
        info!(
            refresh = self.refreshes,
            points = all_points.len(),
            "Refreshing map session"
        );

        let session = self.open().await?;
        if !all_points.is_empty() {
            session.add_markers(all_points).await?;
        }
        Ok(())
    }

    /// Quit the session (if any) and save the final map with `all_points`.
    ///
    /// Safe to call more than once. The map is saved even if quitting the
    /// browser fails.
    pub async fn close(&mut self, all_points: &[GeoPoint]) -> Result<(), DriverError> {
        let quit = match self.session.take() {
            Some(session) => session.quit().await,
            None => Ok(()),
        };
        self.document.save(all_points)?;
        quit
    }
}
