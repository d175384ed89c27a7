//! Application state management

use glimpse_core::{
    Config, Database, Preferences, Result, SyncedSettings, VersionCheckSettings, PREFERENCES_KEY,
    VERSION_CHECK_KEY,
};

/// Everything the primary instance loads before it creates windows
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub preferences: SyncedSettings<Preferences>,
    pub version_check: SyncedSettings<VersionCheckSettings>,
}

impl AppState {
    pub fn open(config: Config) -> Result<Self> {
        config.ensure_dirs()?;
        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db)
    }

    pub fn with_database(config: Config, db: Database) -> Result<Self> {
        let preferences = SyncedSettings::load(db.clone(), PREFERENCES_KEY)?;
        let version_check = SyncedSettings::load(db.clone(), VERSION_CHECK_KEY)?;

        tracing::debug!(
            database = %config.database_path.display(),
            "Application state loaded"
        );

        Ok(Self {
            config,
            db,
            preferences,
            version_check,
        })
    }

    /// Restore the previous run's windows unless told not to
    pub fn restores_session(&self, new_session: bool) -> bool {
        !new_session && self.preferences.get().load_last_session
    }

    pub fn allows_multiple_instances(&self, multi: bool) -> bool {
        multi || self.preferences.get().allow_multiple_instances
    }
}
