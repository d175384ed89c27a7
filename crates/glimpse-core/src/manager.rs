//! Window Session Manager
//!
//! Owns the live windows, the shared Session and the activation order, and
//! drives the exit sequence.

use std::path::Path;
use std::time::Duration;

use glimpse_ipc::QUIT_DELAY;
use glimpse_session::{Session, SessionStore, WindowSession};

use crate::activation::ActivationTracker;
use crate::app::{AppEvent, AppEventSender};
use crate::config::ConfigurationStore;
use crate::dispatcher::FileOpenTarget;
use crate::version::VersionCheck;
use crate::window::{Window, WindowEvent, WindowEvents, WindowFactory, WindowId};
use crate::Result;

pub struct WindowManager<F: WindowFactory> {
    factory: F,
    /// Created on first use
    session: Option<Session>,
    /// Live windows in creation order
    windows: Vec<(WindowId, F::Window)>,
    activation: ActivationTracker,
    session_store: Box<dyn SessionStore>,
    config_stores: Vec<Box<dyn ConfigurationStore>>,
    version_check: Option<Box<dyn VersionCheck>>,
    events: AppEventSender,
    next_id: u64,
    shutting_down: bool,
    background_started: bool,
}

impl<F: WindowFactory> WindowManager<F> {
    pub fn new(factory: F, session_store: Box<dyn SessionStore>, events: AppEventSender) -> Self {
        Self {
            factory,
            session: None,
            windows: Vec::new(),
            activation: ActivationTracker::new(),
            session_store,
            config_stores: Vec::new(),
            version_check: None,
            events,
            next_id: 1,
            shutting_down: false,
            background_started: false,
        }
    }

    /// Register a store to write back at shutdown, in registration order
    pub fn with_configuration_store(mut self, store: Box<dyn ConfigurationStore>) -> Self {
        self.config_stores.push(store);
        self
    }

    pub fn with_version_check(mut self, check: Box<dyn VersionCheck>) -> Self {
        self.version_check = Some(check);
        self
    }

    /// Replace the in-memory session with the persisted one
    pub fn restore_session(&mut self) -> Result<()> {
        let session = self.session_store.load()?;
        self.session = Some(session);
        Ok(())
    }

    /// Startup: one window per saved fragment, or a single fresh window when
    /// nothing was saved. Returns the most recently created window.
    pub fn reload_or_create(&mut self) -> Result<WindowId> {
        let fragments = self.ensure_session().window_sessions();

        let mut last = None;
        for fragment in fragments {
            let id = self.spawn(fragment)?;
            if let Some(window) = self.window_mut(id) {
                window.reload_geometry();
                window.reload_session();
                window.show();
            }
            last = Some(id);
        }

        match last {
            Some(id) => Ok(id),
            None => {
                let id = self.new_window()?;
                self.show_window(id);
                Ok(id)
            }
        }
    }

    /// Create a window on a fresh fragment. The window is not shown.
    pub fn new_window(&mut self) -> Result<WindowId> {
        let fragment = self.ensure_session().new_window_session();
        self.spawn(fragment)
    }

    /// Open `path` in the current window, creating one if none is alive
    pub fn load_file_non_interactive(&mut self, path: &Path) -> Result<()> {
        if self.shutting_down {
            tracing::warn!(path = %path.display(), "Ignoring file load during exit");
            return Ok(());
        }

        let id = match self.current_window() {
            Some(id) => id,
            None => {
                let id = self.new_window()?;
                self.show_window(id);
                id
            }
        };

        tracing::info!(window = %id, path = %path.display(), "Loading file");
        if let Some(window) = self.window_mut(id) {
            window.load_file_non_interactive(path);
        }
        Ok(())
    }

    /// Close every window and persist. Runs once; later calls do nothing.
    pub fn shutdown(&mut self) {
        if self.shutting_down {
            tracing::debug!("Exit already in progress");
            return;
        }
        self.shutting_down = true;

        tracing::info!(window_count = self.windows.len(), "Exit application");

        // Set first so closing windows keep their fragments for the next start
        if let Some(session) = &self.session {
            session.set_exit_requested(true);
        }

        // Later windows may depend on state owned by earlier ones
        let windows = std::mem::take(&mut self.windows);
        for (id, mut window) in windows.into_iter().rev() {
            window.close();
            tracing::debug!(window = %id, "Window closed");
        }

        if let Some(session) = &self.session {
            if let Err(e) = self.session_store.save(session) {
                tracing::error!(error = %e, "Failed to save session");
            }
        }

        for store in &self.config_stores {
            if let Err(e) = store.save() {
                tracing::error!(error = %e, "Failed to save configuration");
            }
        }

        self.schedule_quit(QUIT_DELAY);
    }

    pub fn handle_window_event(&mut self, id: WindowId, event: WindowEvent) -> Result<()> {
        match event {
            WindowEvent::NewWindowRequested => {
                if self.shutting_down {
                    return Ok(());
                }
                let new_id = self.new_window()?;
                self.show_window(new_id);
            }
            WindowEvent::Activated => {
                tracing::debug!(window = %id, "Window activated");
                self.activation.push(id);
            }
            WindowEvent::ExitRequested => self.shutdown(),
            WindowEvent::Closed => {
                self.windows.retain(|(window_id, _)| *window_id != id);
                tracing::info!(window = %id, "Window closed by user");
            }
        }
        Ok(())
    }

    /// Kick off one-shot background work. Later calls do nothing.
    pub fn start_background_tasks(&mut self) {
        if self.background_started {
            return;
        }
        self.background_started = true;

        tracing::debug!("Starting background tasks");
        if let Some(check) = self.version_check.as_mut() {
            check.start_check();
        }
    }

    /// The window non-interactive commands go to
    pub fn current_window(&mut self) -> Option<WindowId> {
        let windows = &self.windows;
        self.activation
            .current_live(|id| windows.iter().any(|(window_id, _)| *window_id == id))
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.iter().map(|(id, _)| *id).collect()
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn window(&self, id: WindowId) -> Option<&F::Window> {
        self.windows
            .iter()
            .find(|(window_id, _)| *window_id == id)
            .map(|(_, window)| window)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    fn ensure_session(&mut self) -> &Session {
        self.session.get_or_insert_with(Session::new)
    }

    fn spawn(&mut self, fragment: WindowSession) -> Result<WindowId> {
        let id = WindowId(self.next_id);
        self.next_id += 1;

        let window_session = fragment.id().to_string();
        let events = WindowEvents::new(id, self.events.clone());
        let window = self.factory.create(fragment, events)?;

        self.windows.push((id, window));
        self.activation.push(id);

        tracing::info!(window = %id, window_session = %window_session, "Window created");

        Ok(id)
    }

    fn show_window(&mut self, id: WindowId) {
        if let Some(window) = self.window_mut(id) {
            window.show();
        }
    }

    fn window_mut(&mut self, id: WindowId) -> Option<&mut F::Window> {
        self.windows
            .iter_mut()
            .find(|(window_id, _)| *window_id == id)
            .map(|(_, window)| window)
    }

    fn schedule_quit(&self, delay: Duration) {
        let _ = self.events.send(AppEvent::QuitAfter(delay));
    }
}

impl<F: WindowFactory> FileOpenTarget for WindowManager<F> {
    fn load_file_non_interactive(&mut self, path: &Path) -> Result<()> {
        WindowManager::load_file_non_interactive(self, path)
    }
}
