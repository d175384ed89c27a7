//! Window capability
//!
//! Rendering, file loading and widgets live behind these traits. The manager
//! only creates, shows, closes and feeds windows, and listens to the events
//! they raise through their [`WindowEvents`] handle.

use std::fmt;
use std::path::Path;

use glimpse_session::WindowSession;

use crate::app::{AppEvent, AppEventSender};
use crate::Result;

/// Handle naming one top-level window for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub(crate) u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// User asked for another window
    NewWindowRequested,
    /// Window gained focus
    Activated,
    /// User asked to quit the application
    ExitRequested,
    /// Window was closed by the user and is gone
    Closed,
}

/// Subscription handed to each window at creation.
///
/// Events are queued onto the main context and handled after the current
/// operation finishes, never re-entrantly.
#[derive(Debug, Clone)]
pub struct WindowEvents {
    id: WindowId,
    sender: AppEventSender,
}

impl WindowEvents {
    pub(crate) fn new(id: WindowId, sender: AppEventSender) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn new_window_requested(&self) {
        self.emit(WindowEvent::NewWindowRequested);
    }

    pub fn activated(&self) {
        self.emit(WindowEvent::Activated);
    }

    pub fn exit_requested(&self) {
        self.emit(WindowEvent::ExitRequested);
    }

    pub fn closed(&self) {
        self.emit(WindowEvent::Closed);
    }

    fn emit(&self, event: WindowEvent) {
        // A closed queue means the application is already gone
        let _ = self.sender.send(AppEvent::Window { id: self.id, event });
    }
}

pub trait Window {
    fn show(&mut self);

    /// Close for good. The window saves its fragment before releasing it.
    fn close(&mut self);

    fn reload_geometry(&mut self);

    /// Restore open files and search state from the fragment
    fn reload_session(&mut self);

    fn load_file_non_interactive(&mut self, path: &Path);
}

/// Builds windows bound to a session fragment.
pub trait WindowFactory {
    type Window: Window;

    /// Fails if the fragment cannot be turned into a window, for example when
    /// its persisted state is corrupt.
    fn create(&mut self, session: WindowSession, events: WindowEvents) -> Result<Self::Window>;
}
