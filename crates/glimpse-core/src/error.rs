//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] glimpse_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] glimpse_session::SessionError),

    #[error("Instance coordination error: {0}")]
    Ipc(#[from] glimpse_ipc::IpcError),

    #[error("Window error: {0}")]
    Window(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
