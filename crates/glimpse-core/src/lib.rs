//! Glimpse Core
//!
//! Window-session lifecycle for a multi-window application: which windows
//! exist, which one is current, how files from other launches reach them, and
//! how everything is persisted on the way out.

mod activation;
mod app;
mod config;
mod dispatcher;
mod error;
mod manager;
mod version;
mod window;

#[cfg(test)]
mod testing;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_appender::rolling::{RollingFileAppender, Rotation};

pub use activation::ActivationTracker;
pub use app::{channel, App, AppEvent, AppEventReceiver, AppEventSender};
pub use config::{
    Config, ConfigurationStore, Preferences, SyncedSettings, VersionCheckSettings,
    PREFERENCES_KEY, VERSION_CHECK_KEY,
};
pub use dispatcher::{FileOpenTarget, MessageDispatcher};
pub use error::CoreError;
pub use manager::WindowManager;
pub use version::{
    is_newer, NoReleaseFeed, Release, ReleaseFeed, ScheduledVersionCheck, VersionCheck,
};
pub use window::{Window, WindowEvent, WindowEvents, WindowFactory, WindowId};

pub use glimpse_ipc::{InstanceKey, InstanceMessage, Messenger};
pub use glimpse_session::{DatabaseSessionStore, Session, SessionError, SessionStore, WindowSession};
pub use glimpse_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Rotated logs kept in the background log directory
const BACKGROUND_LOG_FILES: usize = 5;

/// Initialize logging.
///
/// `RUST_LOG` wins over `level`. Output goes to stderr, or to `log_file`
/// without colors when one is given. With `background_dir` set, every record
/// is also written to a daily rotated log there, whatever the foreground
/// target.
pub fn init_logging(
    level: &str,
    log_file: Option<&Path>,
    background_dir: Option<&Path>,
) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (console, file) = match log_file {
        Some(path) => {
            let writer = Mutex::new(File::create(path)?);
            let layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(writer);
            (None, Some(layer))
        }
        None => (Some(fmt::layer().with_target(true)), None),
    };

    let background = match background_dir {
        Some(dir) => Some(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(background_appender(dir)?),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .with(background)
        .try_init()
        .map_err(|e| CoreError::Config(e.to_string()))?;

    Ok(())
}

fn background_appender(dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("glimpse")
        .filename_suffix("log")
        .max_log_files(BACKGROUND_LOG_FILES)
        .build(dir)
        .map_err(|e| CoreError::Config(e.to_string()))
}

/// `glimpse_<date>_<pid>.log` inside `dir`
pub fn log_file_path(dir: &Path, pid: u32) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    dir.join(format!("glimpse_{date}_{pid}.log"))
}
