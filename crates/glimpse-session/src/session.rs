//! Session data structures

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::SessionError;
use crate::Result;

/// Persisted state of one window.
///
/// `geometry` and `state` are opaque JSON documents owned by whatever window
/// implementation wrote them; the session layer never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    /// Unique identifier
    pub id: String,
    /// Window placement, if the window ever reported one
    pub geometry: Option<String>,
    /// Window content (open files, search state)
    pub state: String,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl WindowRecord {
    pub fn new(id: String) -> Self {
        Self {
            id,
            geometry: None,
            state: "{}".to_string(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    /// Records in window creation order
    windows: Vec<WindowRecord>,
    exit_requested: bool,
}

/// Shared handle to the application session.
///
/// Cloning is cheap; every clone observes the same windows and flag.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(windows: Vec<WindowRecord>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionState {
                windows,
                exit_requested: false,
            })),
        }
    }

    /// Fragments for every persisted window, in creation order
    pub fn window_sessions(&self) -> Vec<WindowSession> {
        self.inner
            .read()
            .windows
            .iter()
            .map(|record| WindowSession {
                session: self.clone(),
                id: record.id.clone(),
            })
            .collect()
    }

    /// Allocate a fragment with a freshly generated identifier
    pub fn new_window_session(&self) -> WindowSession {
        let id = Uuid::new_v4().to_string();
        self.inner.write().windows.push(WindowRecord::new(id.clone()));

        tracing::debug!(window_session = %id, "Allocated window session");

        WindowSession {
            session: self.clone(),
            id,
        }
    }

    /// Snapshot of the records, for persistence
    pub fn records(&self) -> Vec<WindowRecord> {
        self.inner.read().windows.clone()
    }

    pub fn window_count(&self) -> usize {
        self.inner.read().windows.len()
    }

    pub fn exit_requested(&self) -> bool {
        self.inner.read().exit_requested
    }

    pub fn set_exit_requested(&self, exit_requested: bool) {
        self.inner.write().exit_requested = exit_requested;
    }

    fn record(&self, id: &str) -> Option<WindowRecord> {
        self.inner
            .read()
            .windows
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    fn update_record<F>(&self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut WindowRecord),
    {
        let mut state = self.inner.write();
        let record = state
            .windows
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        f(record);
        record.updated_at = Utc::now();
        Ok(())
    }

    fn remove_record(&self, id: &str) {
        self.inner.write().windows.retain(|record| record.id != id);
    }
}

/// One window's slice of the shared [`Session`].
///
/// Reads go through to the shared session; writes touch only this
/// fragment's record.
#[derive(Debug, Clone)]
pub struct WindowSession {
    session: Session,
    id: String,
}

impl WindowSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn geometry(&self) -> Option<String> {
        self.session.record(&self.id).and_then(|r| r.geometry)
    }

    pub fn save_geometry(&self, geometry: String) -> Result<()> {
        self.session
            .update_record(&self.id, |record| record.geometry = Some(geometry))
    }

    /// Raw state document; an empty object if the record is gone
    pub fn state(&self) -> String {
        self.session
            .record(&self.id)
            .map(|r| r.state)
            .unwrap_or_else(|| "{}".to_string())
    }

    pub fn save_state(&self, state: String) -> Result<()> {
        self.session
            .update_record(&self.id, |record| record.state = state)
    }

    /// Decode the state document into a window's own type.
    ///
    /// Fails with [`SessionError::CorruptFragment`] when the stored document
    /// does not match `T`.
    pub fn decode_state<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.state()).map_err(|source| SessionError::CorruptFragment {
            id: self.id.clone(),
            source,
        })
    }

    pub fn encode_state<T: Serialize>(&self, state: &T) -> Result<()> {
        let raw = serde_json::to_string(state)?;
        self.save_state(raw)
    }

    /// Release this fragment as its window closes.
    ///
    /// While the application is exiting the record stays so the window comes
    /// back on the next start; otherwise the window is gone for good.
    pub fn close(self) {
        if self.session.exit_requested() {
            tracing::debug!(window_session = %self.id, "Keeping window session for restore");
        } else {
            self.session.remove_record(&self.id);
            tracing::debug!(window_session = %self.id, "Dropped window session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct TestState {
        #[serde(default)]
        files: Vec<String>,
    }

    #[test]
    fn test_new_window_sessions_keep_order() {
        let session = Session::new();
        let first = session.new_window_session();
        let second = session.new_window_session();

        assert_ne!(first.id(), second.id());
        let ids: Vec<String> = session
            .window_sessions()
            .iter()
            .map(|w| w.id().to_string())
            .collect();
        assert_eq!(ids, vec![first.id().to_string(), second.id().to_string()]);
    }

    #[test]
    fn test_fragment_writes_are_shared() {
        let session = Session::new();
        let window = session.new_window_session();

        window.save_geometry("{\"x\":10}".to_string()).unwrap();
        window
            .encode_state(&TestState {
                files: vec!["/var/log/syslog".to_string()],
            })
            .unwrap();

        let restored = &session.window_sessions()[0];
        assert_eq!(restored.geometry().as_deref(), Some("{\"x\":10}"));
        let state: TestState = restored.decode_state().unwrap();
        assert_eq!(state.files, vec!["/var/log/syslog"]);
    }

    #[test]
    fn test_empty_state_decodes_to_default() {
        let session = Session::new();
        let window = session.new_window_session();

        let state: TestState = window.decode_state().unwrap();
        assert_eq!(state, TestState::default());
    }

    #[test]
    fn test_corrupt_state_is_reported() {
        let mut record = WindowRecord::new("w-1".to_string());
        record.state = "{\"files\": 42}".to_string();
        let session = Session::from_records(vec![record]);

        let err = session.window_sessions()[0]
            .decode_state::<TestState>()
            .unwrap_err();
        assert!(matches!(err, SessionError::CorruptFragment { ref id, .. } if id == "w-1"));
    }

    #[test]
    fn test_close_drops_fragment_unless_exiting() {
        let session = Session::new();
        let closed = session.new_window_session();
        let kept = session.new_window_session();

        closed.close();
        assert_eq!(session.window_count(), 1);

        session.set_exit_requested(true);
        kept.close();
        assert_eq!(session.window_count(), 1);
    }

    #[test]
    fn test_write_to_removed_fragment_fails() {
        let session = Session::new();
        let window = session.new_window_session();
        let stale = window.clone();
        window.close();

        let err = stale.save_state("{}".to_string()).unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }
}
