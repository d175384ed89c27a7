//! Glimpse Session Management
//!
//! - A Session is the persisted record of every open window
//! - Each window owns one fragment (`WindowSession`) of the shared Session
//! - Fragments survive a window close only while the application is exiting
//! - The Session is written once, at shutdown

mod error;
mod session;
mod store;

pub use error::SessionError;
pub use session::{Session, WindowRecord, WindowSession};
pub use store::{DatabaseSessionStore, SessionStore};

pub type Result<T> = std::result::Result<T, SessionError>;
