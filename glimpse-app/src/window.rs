//! Headless window
//!
//! Stands in for a rendered window: it tracks the files it has open in its
//! session fragment and logs what a GUI would do.

use std::path::Path;

use serde::{Deserialize, Serialize};

use glimpse_core::{Result, Window, WindowEvents, WindowFactory, WindowId, WindowSession};

/// What a window keeps in its fragment between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessState {
    pub files: Vec<String>,
}

pub struct HeadlessWindow {
    id: WindowId,
    /// Released on close
    fragment: Option<WindowSession>,
    state: HeadlessState,
    visible: bool,
    events: WindowEvents,
}

impl HeadlessWindow {
    pub fn files(&self) -> &[String] {
        &self.state.files
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn persist(&self) {
        let Some(fragment) = &self.fragment else {
            return;
        };
        if let Err(e) = fragment.encode_state(&self.state) {
            tracing::error!(window = %self.id, error = %e, "Failed to save window state");
        }
    }
}

impl Window for HeadlessWindow {
    fn show(&mut self) {
        self.visible = true;
        tracing::info!(window = %self.id, files = self.state.files.len(), "Window shown");
        // A freshly shown window takes focus
        self.events.activated();
    }

    fn close(&mut self) {
        self.persist();
        self.visible = false;
        if let Some(fragment) = self.fragment.take() {
            fragment.close();
        }
        tracing::debug!(window = %self.id, "Window released its session");
    }

    fn reload_geometry(&mut self) {
        let geometry = self.fragment.as_ref().and_then(WindowSession::geometry);
        tracing::debug!(window = %self.id, geometry = ?geometry, "Geometry restored");
    }

    fn reload_session(&mut self) {
        for file in &self.state.files {
            tracing::info!(window = %self.id, file = %file, "Reopening file");
        }
    }

    fn load_file_non_interactive(&mut self, path: &Path) {
        let file = path.to_string_lossy().into_owned();
        if self.state.files.contains(&file) {
            tracing::debug!(window = %self.id, file = %file, "File already open");
            return;
        }

        tracing::info!(window = %self.id, file = %file, "Opening file");
        self.state.files.push(file);
        self.persist();
    }
}

#[derive(Debug, Default)]
pub struct HeadlessWindowFactory;

impl WindowFactory for HeadlessWindowFactory {
    type Window = HeadlessWindow;

    fn create(&mut self, session: WindowSession, events: WindowEvents) -> Result<HeadlessWindow> {
        let state: HeadlessState = session.decode_state()?;

        Ok(HeadlessWindow {
            id: events.id(),
            fragment: Some(session),
            state,
            visible: false,
            events,
        })
    }
}
