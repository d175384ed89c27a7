//! Application configuration
//!
//! `Config` holds filesystem locations resolved at startup. Preferences and
//! version-check settings are user state kept in the settings table and
//! written back once, at shutdown.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use glimpse_storage::Database;

use crate::Result;

const DATA_DIR_ENV: &str = "GLIMPSE_DATA_DIR";

pub const PREFERENCES_KEY: &str = "preferences";
pub const VERSION_CHECK_KEY: &str = "version_check";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of everything Glimpse writes
    pub data_dir: PathBuf,
    /// Path to the database file
    pub database_path: PathBuf,
    /// Where `--log` writes log files
    pub log_dir: PathBuf,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("glimpse.db"),
            log_dir: data_dir.join("logs"),
            data_dir,
        }
    }

    pub fn data_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }

        dirs::data_local_dir()
            .map(|d| d.join("Glimpse"))
            .unwrap_or_else(|| PathBuf::from(".glimpse"))
    }

    /// Create the directories this config points at
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Every launch opens its own windows instead of handing off to the primary
    pub allow_multiple_instances: bool,
    /// Restore the windows of the previous run at startup
    pub load_last_session: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            allow_multiple_instances: false,
            load_last_session: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionCheckSettings {
    pub enabled: bool,
    pub interval_hours: u32,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl Default for VersionCheckSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: 24,
            last_checked_at: None,
        }
    }
}

/// Something written back at shutdown, after every window closed
pub trait ConfigurationStore {
    fn save(&self) -> Result<()>;
}

/// A settings value bound to its database key.
///
/// Clones share the value, so the shutdown path and any background user of
/// the setting see the same state.
pub struct SyncedSettings<T> {
    db: Database,
    key: &'static str,
    value: Arc<RwLock<T>>,
}

impl<T> SyncedSettings<T>
where
    T: Clone + Default + Serialize + DeserializeOwned,
{
    /// Load `key`, falling back to defaults when it was never saved
    pub fn load(db: Database, key: &'static str) -> Result<Self> {
        let value = db.get_json::<T>(key)?.unwrap_or_default();

        Ok(Self {
            db,
            key,
            value: Arc::new(RwLock::new(value)),
        })
    }

    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let mut value = self.value.write();
        f(&mut *value);
    }
}

impl<T> Clone for SyncedSettings<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            key: self.key,
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> ConfigurationStore for SyncedSettings<T>
where
    T: Serialize,
{
    fn save(&self) -> Result<()> {
        self.db.set_json(self.key, &*self.value.read())?;
        tracing::debug!(key = self.key, "Saved settings");
        Ok(())
    }
}
