//! Primary election and message transport

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

use crate::error::IpcError;
use crate::key::{Endpoint, InstanceKey};
use crate::message::{read_envelope, write_envelope, InstanceMessage};
use crate::transport::{self, ElectionLock, Listener, Stream};
use crate::Result;

/// Upper bound on handing a message to the primary
pub const SEND_TIMEOUT: Duration = Duration::from_millis(5000);

/// Grace period between a hand-off and process exit, so the transport flushes
pub const QUIT_DELAY: Duration = Duration::from_millis(100);

/// Upper bound on reading one message from a connected secondary
pub const RECEIVE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Rounds of lock-then-connect before giving up on a lock holder that never
/// starts listening
const ELECTION_ATTEMPTS: u32 = 50;
const ELECTION_RETRY_DELAY: Duration = Duration::from_millis(20);

#[derive(Debug)]
enum Role {
    /// Won the election; the listener is taken once `listen` starts
    Primary(Option<Listener>),
    /// Lost the election; holds the probe connection until the first send
    Secondary(Option<Stream>),
    /// Election skipped, every launch owns its own windows
    Standalone,
}

/// This process's side of the single-instance protocol
#[derive(Debug)]
pub struct Messenger {
    role: Role,
    endpoint: Option<Endpoint>,
    version: String,
    send_timeout: Duration,
}

impl Messenger {
    /// Compete for `key`. Any launch of the same application by the same
    /// user competes for the same endpoint.
    pub async fn elect(key: &InstanceKey, version: impl Into<String>) -> Result<Self> {
        Self::elect_at(key.endpoint(), version).await
    }

    pub async fn elect_at(endpoint: Endpoint, version: impl Into<String>) -> Result<Self> {
        let role = elect_role(&endpoint).await?;

        let messenger = Self {
            role,
            endpoint: Some(endpoint),
            version: version.into(),
            send_timeout: SEND_TIMEOUT,
        };

        tracing::info!(
            endpoint = %messenger.endpoint_label(),
            primary = messenger.is_primary(),
            "Instance election finished"
        );

        Ok(messenger)
    }

    /// A messenger that never talks to other processes
    pub fn standalone(version: impl Into<String>) -> Self {
        Self {
            role: Role::Standalone,
            endpoint: None,
            version: version.into(),
            send_timeout: SEND_TIMEOUT,
        }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn is_primary(&self) -> bool {
        !matches!(self.role, Role::Secondary(_))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Hand `files` to the primary.
    ///
    /// Returns once the bytes are handed to the transport, or once the send
    /// timeout passes. Failures are logged and reported as `false`; there is
    /// no retry.
    pub async fn send_to_primary(&mut self, files: Vec<String>) -> bool {
        let Role::Secondary(pending) = &mut self.role else {
            tracing::error!("Only a secondary instance forwards files");
            return false;
        };
        let Some(endpoint) = self.endpoint.as_ref() else {
            return false;
        };

        let message = InstanceMessage::new(self.version.clone(), files);
        let file_count = message.files.len();
        let timeout = self.send_timeout;
        let stream = pending.take();

        let delivery = async {
            let stream = match stream {
                Some(stream) => stream,
                None => transport::connect(endpoint).await?,
            };
            deliver(stream, &message).await
        };

        match tokio::time::timeout(timeout, delivery).await {
            Ok(Ok(())) => {
                tracing::info!(file_count, "Forwarded files to primary instance");
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, file_count, "Could not reach primary instance");
                false
            }
            Err(_) => {
                tracing::warn!(?timeout, file_count, "Primary instance did not accept files in time");
                false
            }
        }
    }

    /// Start accepting messages from later launches.
    ///
    /// Connections are served one at a time in accept order and every decoded
    /// message is handed to `on_message` on the accept task. Callers queue
    /// the message onto their own execution context. A standalone messenger
    /// has nothing to listen on and returns `None`.
    pub fn listen<F>(&mut self, on_message: F) -> Result<Option<JoinHandle<()>>>
    where
        F: FnMut(InstanceMessage) + Send + 'static,
    {
        match &mut self.role {
            Role::Primary(listener) => {
                let listener = listener.take().ok_or(IpcError::WrongRole("idle primary"))?;
                Ok(Some(tokio::spawn(accept_loop(listener, on_message))))
            }
            Role::Standalone => Ok(None),
            Role::Secondary(_) => Err(IpcError::WrongRole("primary")),
        }
    }

    fn endpoint_label(&self) -> String {
        self.endpoint
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "none".to_string())
    }
}

/// Whoever takes the endpoint's lock is the primary; everyone else connects
/// to it. A lock holder that is not listening yet is between taking the lock
/// and binding, so the connect is retried.
async fn elect_role(endpoint: &Endpoint) -> Result<Role> {
    let lock_path = endpoint.lock_path();

    for attempt in 0..ELECTION_ATTEMPTS {
        if let Some(lock) = ElectionLock::try_acquire(&lock_path)? {
            let listener = Listener::bind(endpoint, lock).await?;
            return Ok(Role::Primary(Some(listener)));
        }

        match transport::connect(endpoint).await {
            Ok(stream) => return Ok(Role::Secondary(Some(stream))),
            Err(e) if transport::is_not_running(&e) => {
                tracing::trace!(attempt, endpoint = %endpoint, "Primary not listening yet");
                tokio::time::sleep(ELECTION_RETRY_DELAY).await;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::error!(endpoint = %endpoint, "Instance endpoint is locked but nobody answers");
    Err(IpcError::EndpointTaken(endpoint.to_string()))
}

async fn deliver<S>(mut stream: S, message: &InstanceMessage) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    write_envelope(&mut stream, message).await?;
    stream.shutdown().await?;
    Ok(())
}

async fn accept_loop<F>(listener: Listener, mut on_message: F)
where
    F: FnMut(InstanceMessage),
{
    loop {
        let mut stream = match listener.accept().await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to accept instance connection");
                continue;
            }
        };

        match tokio::time::timeout(RECEIVE_TIMEOUT, read_envelope(&mut stream)).await {
            Ok(Ok(Some(message))) => {
                tracing::debug!(
                    version = %message.version,
                    file_count = message.files.len(),
                    "Received message from secondary instance"
                );
                on_message(message);
            }
            Ok(Ok(None)) => tracing::trace!("Secondary instance closed without a message"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Dropped malformed instance message"),
            Err(_) => tracing::warn!("Secondary instance stalled, dropping connection"),
        }
    }
}
