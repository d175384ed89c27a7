//! Election key
//!
//! The key covers the logical application and the user only. Executable
//! path and version are left out so every install and every release of the
//! application competes for the same primary.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;

/// First port of the dynamic range used for loopback endpoints
#[cfg(not(unix))]
const PORT_BASE: u16 = 49152;
#[cfg(not(unix))]
const PORT_SPAN: u16 = 16384;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceKey {
    digest: String,
}

/// Where the primary listens for secondaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    #[cfg(unix)]
    Socket(PathBuf),
    #[cfg(not(unix))]
    Loopback(u16),
}

impl InstanceKey {
    /// Key for `app_id` as seen by the current user
    pub fn new(app_id: &str) -> Self {
        Self::for_user(app_id, &current_user())
    }

    pub fn for_user(app_id: &str, user: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(app_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(user.as_bytes());
        let digest = hex::encode(hasher.finalize());

        Self {
            digest: digest[..16].to_string(),
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    #[cfg(unix)]
    pub fn endpoint(&self) -> Endpoint {
        let dir = dirs::runtime_dir().unwrap_or_else(std::env::temp_dir);
        self.endpoint_in(dir)
    }

    /// Endpoint rooted in an explicit directory
    #[cfg(unix)]
    pub fn endpoint_in(&self, dir: impl Into<PathBuf>) -> Endpoint {
        Endpoint::Socket(dir.into().join(format!("glimpse-{}.sock", self.digest)))
    }

    #[cfg(not(unix))]
    pub fn endpoint(&self) -> Endpoint {
        let raw = u16::from_str_radix(&self.digest[..4], 16).unwrap_or(0);
        Endpoint::Loopback(PORT_BASE + raw % PORT_SPAN)
    }
}

impl Endpoint {
    /// Lock file guarding election for this endpoint. Held by the primary for
    /// as long as it lives.
    pub fn lock_path(&self) -> PathBuf {
        match self {
            #[cfg(unix)]
            Endpoint::Socket(path) => path.with_extension("lock"),
            #[cfg(not(unix))]
            Endpoint::Loopback(port) => std::env::temp_dir().join(format!("glimpse-{port}.lock")),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(unix)]
            Endpoint::Socket(path) => write!(f, "{}", path.display()),
            #[cfg(not(unix))]
            Endpoint::Loopback(port) => write!(f, "127.0.0.1:{port}"),
        }
    }
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "default".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_stable_per_user() {
        let a = InstanceKey::for_user("glimpse", "alice");
        let b = InstanceKey::for_user("glimpse", "alice");
        let c = InstanceKey::for_user("glimpse", "bob");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.digest().len(), 16);
    }

    #[test]
    fn test_key_separates_applications() {
        let a = InstanceKey::for_user("glimpse", "alice");
        let b = InstanceKey::for_user("glimpse-beta", "alice");
        assert_ne!(a, b);
    }

    #[cfg(unix)]
    #[test]
    fn test_socket_endpoint_uses_digest() {
        let key = InstanceKey::for_user("glimpse", "alice");
        let Endpoint::Socket(path) = key.endpoint_in("/tmp/glimpse-test");
        assert_eq!(
            path,
            PathBuf::from(format!("/tmp/glimpse-test/glimpse-{}.sock", key.digest()))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_lock_sits_next_to_socket() {
        let key = InstanceKey::for_user("glimpse", "alice");
        let endpoint = key.endpoint_in("/tmp/glimpse-test");
        assert_eq!(
            endpoint.lock_path(),
            PathBuf::from(format!("/tmp/glimpse-test/glimpse-{}.lock", key.digest()))
        );
    }
}
