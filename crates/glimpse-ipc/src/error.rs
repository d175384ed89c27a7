//! IPC error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not a Glimpse message envelope")]
    BadMagic,

    #[error("Unsupported envelope version: {0}")]
    UnsupportedEnvelope(u8),

    #[error("Payload of {0} bytes exceeds the envelope limit")]
    PayloadTooLarge(usize),

    #[error("Envelope ended early")]
    Truncated,

    #[error("Endpoint {0} is held by another program")]
    EndpointTaken(String),

    #[error("Operation requires the {0} role")]
    WrongRole(&'static str),
}
