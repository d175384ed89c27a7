//! Recording fakes for the window and store collaborators

use parking_lot::Mutex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glimpse_session::{Session, SessionStore, WindowRecord, WindowSession};

use crate::config::ConfigurationStore;
use crate::version::VersionCheck;
use crate::window::{Window, WindowEvents, WindowFactory};
use crate::Result;

/// Ordered log of every collaborator call
pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

pub(crate) fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn entries(journal: &Journal, prefix: &str) -> Vec<String> {
    journal
        .lock()
        .iter()
        .filter(|entry| entry.starts_with(prefix))
        .cloned()
        .collect()
}

#[derive(Deserialize)]
struct FakeState {
    #[serde(default)]
    #[allow(dead_code)]
    files: Vec<String>,
}

pub(crate) struct FakeWindow {
    pub session_id: String,
    pub shown: bool,
    pub loaded: Vec<PathBuf>,
    pub events: WindowEvents,
    fragment: Option<WindowSession>,
    journal: Journal,
}

impl FakeWindow {
    fn log(&self, action: &str) {
        self.journal
            .lock()
            .push(format!("{action} {}", self.session_id));
    }
}

impl Window for FakeWindow {
    fn show(&mut self) {
        self.shown = true;
        self.log("show");
    }

    fn close(&mut self) {
        self.log("close");
        if let Some(fragment) = self.fragment.take() {
            fragment.close();
        }
    }

    fn reload_geometry(&mut self) {
        self.log("geometry");
    }

    fn reload_session(&mut self) {
        self.log("restore");
    }

    fn load_file_non_interactive(&mut self, path: &Path) {
        self.loaded.push(path.to_path_buf());
        self.journal
            .lock()
            .push(format!("load {} {}", self.session_id, path.display()));
    }
}

pub(crate) struct FakeFactory {
    pub journal: Journal,
}

impl WindowFactory for FakeFactory {
    type Window = FakeWindow;

    fn create(&mut self, session: WindowSession, events: WindowEvents) -> Result<FakeWindow> {
        let _state: FakeState = session.decode_state()?;
        let session_id = session.id().to_string();
        self.journal.lock().push(format!("create {session_id}"));

        Ok(FakeWindow {
            session_id,
            shown: false,
            loaded: Vec::new(),
            events,
            fragment: Some(session),
            journal: Arc::clone(&self.journal),
        })
    }
}

/// Serves fixed records and journals every save
pub(crate) struct FakeSessionStore {
    pub records: Vec<WindowRecord>,
    pub journal: Journal,
}

impl SessionStore for FakeSessionStore {
    fn load(&self) -> glimpse_session::Result<Session> {
        Ok(Session::from_records(self.records.clone()))
    }

    fn save(&self, session: &Session) -> glimpse_session::Result<()> {
        self.journal
            .lock()
            .push(format!("save session {}", session.window_count()));
        Ok(())
    }
}

pub(crate) struct FakeConfigStore {
    pub name: &'static str,
    pub journal: Journal,
}

impl ConfigurationStore for FakeConfigStore {
    fn save(&self) -> Result<()> {
        self.journal.lock().push(format!("save config {}", self.name));
        Ok(())
    }
}

pub(crate) struct FakeVersionCheck {
    pub journal: Journal,
}

impl VersionCheck for FakeVersionCheck {
    fn start_check(&mut self) {
        self.journal.lock().push("version check".to_string());
    }
}
