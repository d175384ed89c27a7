//! Glimpse Instance Coordination
//!
//! Exactly one process per user owns the application windows. Later launches
//! find that primary through a local endpoint, hand it their file arguments,
//! and exit without creating any UI.

mod error;
mod key;
mod message;
mod messenger;
mod transport;

pub use error::IpcError;
pub use key::{Endpoint, InstanceKey};
pub use message::{read_envelope, write_envelope, InstanceMessage, MAX_PAYLOAD_LEN};
pub use messenger::{Messenger, QUIT_DELAY, RECEIVE_TIMEOUT, SEND_TIMEOUT};

pub type Result<T> = std::result::Result<T, IpcError>;
