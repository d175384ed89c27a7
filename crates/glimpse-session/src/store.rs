//! Session persistence

use chrono::{DateTime, Utc};

use glimpse_storage::Database;

use crate::session::{Session, WindowRecord};
use crate::Result;

/// Where the Session lives between runs.
pub trait SessionStore {
    fn load(&self) -> Result<Session>;
    fn save(&self, session: &Session) -> Result<()>;
}

/// SQLite-backed store, one row per window
pub struct DatabaseSessionStore {
    db: Database,
}

impl DatabaseSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SessionStore for DatabaseSessionStore {
    fn load(&self) -> Result<Session> {
        let records = self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, geometry, state, updated_at FROM window_sessions ORDER BY position",
            )?;

            let records = stmt
                .query_map([], |row| {
                    let updated_str: String = row.get(3)?;
                    let updated_at = DateTime::parse_from_rfc3339(&updated_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now());

                    Ok(WindowRecord {
                        id: row.get(0)?,
                        geometry: row.get(1)?,
                        state: row.get(2)?,
                        updated_at,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(records)
        })?;

        tracing::info!(window_count = records.len(), "Loaded session");

        Ok(Session::from_records(records))
    }

    fn save(&self, session: &Session) -> Result<()> {
        let records = session.records();

        self.db.transaction(|conn| {
            conn.execute("DELETE FROM window_sessions", [])?;

            for (position, record) in records.iter().enumerate() {
                conn.execute(
                    "INSERT INTO window_sessions (id, position, geometry, state, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        record.id,
                        position as i64,
                        record.geometry,
                        record.state,
                        record.updated_at.to_rfc3339(),
                    ],
                )?;
            }

            Ok(())
        })?;

        tracing::info!(window_count = records.len(), "Saved session");

        Ok(())
    }
}
