//! Local endpoint transport
//!
//! Unix domain sockets where available, loopback TCP elsewhere. Binding and
//! clearing an endpoint only ever happens under its [`ElectionLock`].

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use fs2::FileExt;
#[cfg(not(unix))]
use tokio::net::{TcpListener, TcpStream};
#[cfg(unix)]
use tokio::net::{UnixListener, UnixStream};

use crate::key::Endpoint;

#[cfg(unix)]
pub(crate) type Stream = UnixStream;
#[cfg(not(unix))]
pub(crate) type Stream = TcpStream;

/// Exclusive advisory lock on the endpoint's lock file.
///
/// The OS drops it when the holder exits, crashed or not, so holding it is
/// what makes a process the primary.
#[derive(Debug)]
pub(crate) struct ElectionLock {
    file: File,
}

impl ElectionLock {
    /// `None` when another process holds the lock
    pub(crate) fn try_acquire(path: &Path) -> io::Result<Option<Self>> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Drop for ElectionLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Bound endpoint owned by the primary. Dropping it removes the socket file
/// first and releases the election lock last.
#[derive(Debug)]
pub(crate) struct Listener {
    #[cfg(unix)]
    inner: UnixListener,
    #[cfg(not(unix))]
    inner: TcpListener,
    endpoint: Endpoint,
    _lock: ElectionLock,
}

impl Listener {
    /// Bind under `lock`. A socket file still on disk was left by a primary
    /// that no longer holds the lock, so it is cleared first.
    #[cfg(unix)]
    pub(crate) async fn bind(endpoint: &Endpoint, lock: ElectionLock) -> io::Result<Self> {
        let Endpoint::Socket(path) = endpoint;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        match std::fs::remove_file(path) {
            Ok(()) => tracing::warn!(endpoint = %endpoint, "Cleared endpoint left by a previous primary"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        Ok(Self {
            inner: UnixListener::bind(path)?,
            endpoint: endpoint.clone(),
            _lock: lock,
        })
    }

    #[cfg(not(unix))]
    pub(crate) async fn bind(endpoint: &Endpoint, lock: ElectionLock) -> io::Result<Self> {
        let Endpoint::Loopback(port) = endpoint;

        Ok(Self {
            inner: TcpListener::bind(("127.0.0.1", *port)).await?,
            endpoint: endpoint.clone(),
            _lock: lock,
        })
    }

    pub(crate) async fn accept(&self) -> io::Result<Stream> {
        let (stream, _) = self.inner.accept().await?;
        Ok(stream)
    }
}

#[cfg(unix)]
impl Drop for Listener {
    fn drop(&mut self) {
        let Endpoint::Socket(path) = &self.endpoint;
        let _ = std::fs::remove_file(path);
    }
}

#[cfg(unix)]
pub(crate) async fn connect(endpoint: &Endpoint) -> io::Result<Stream> {
    let Endpoint::Socket(path) = endpoint;
    UnixStream::connect(path).await
}

#[cfg(not(unix))]
pub(crate) async fn connect(endpoint: &Endpoint) -> io::Result<Stream> {
    let Endpoint::Loopback(port) = endpoint;
    TcpStream::connect(("127.0.0.1", *port)).await
}

pub(crate) fn is_not_running(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused
    )
}
