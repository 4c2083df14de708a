//! Promo Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod error;
pub mod events;
pub mod mailer;
pub mod marketplace_db;
pub mod media;
pub mod profile;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use server::{run_server, RequestsLoggingLevel};
pub use user::{Role, SqliteUserStore, UserManager, UserStore};
