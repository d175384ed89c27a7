//! One-shot background check for a newer release

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::config::{SyncedSettings, VersionCheckSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: String,
    pub url: String,
}

/// Source of the latest published release. Runs on a blocking thread.
pub trait ReleaseFeed: Send + Sync + 'static {
    fn latest_release(&self) -> Option<Release>;
}

/// Feed for builds that do not look for updates
#[derive(Debug, Default)]
pub struct NoReleaseFeed;

impl ReleaseFeed for NoReleaseFeed {
    fn latest_release(&self) -> Option<Release> {
        None
    }
}

pub trait VersionCheck {
    fn start_check(&mut self);
}

/// Checks at most once per configured interval
pub struct ScheduledVersionCheck {
    settings: SyncedSettings<VersionCheckSettings>,
    current_version: String,
    feed: Arc<dyn ReleaseFeed>,
}

impl ScheduledVersionCheck {
    pub fn new(
        settings: SyncedSettings<VersionCheckSettings>,
        current_version: impl Into<String>,
        feed: Arc<dyn ReleaseFeed>,
    ) -> Self {
        Self {
            settings,
            current_version: current_version.into(),
            feed,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let settings = self.settings.get();
        if !settings.enabled {
            return false;
        }

        match settings.last_checked_at {
            Some(last) => now - last >= Duration::hours(i64::from(settings.interval_hours)),
            None => true,
        }
    }
}

impl VersionCheck for ScheduledVersionCheck {
    fn start_check(&mut self) {
        let now = Utc::now();
        if !self.is_due(now) {
            tracing::debug!("Version check not due");
            return;
        }

        self.settings.update(|s| s.last_checked_at = Some(now));

        let feed = Arc::clone(&self.feed);
        let current = self.current_version.clone();
        tokio::task::spawn_blocking(move || match feed.latest_release() {
            Some(release) if is_newer(&release.version, &current) => {
                tracing::info!(
                    version = %release.version,
                    url = %release.url,
                    "A new version is available"
                );
            }
            _ => tracing::debug!(version = %current, "Running the latest version"),
        });
    }
}

/// Compare dotted numeric versions; non-numeric parts count as zero
pub fn is_newer(candidate: &str, current: &str) -> bool {
    fn parts(version: &str) -> Vec<u64> {
        version
            .trim_start_matches('v')
            .split('.')
            .map(|p| p.parse().unwrap_or(0))
            .collect()
    }

    let (mut a, mut b) = (parts(candidate), parts(current));
    let len = a.len().max(b.len());
    a.resize(len, 0);
    b.resize(len, 0);
    a > b
}
