//! Session registry.
//!
//! A session is an opaque id bound to an expiry. An id is valid while the
//! current time is strictly before its expiry; the lookup itself enforces this,
//! so a periodic sweep only reclaims memory and never decides validity.

mod memory;

pub use memory::{MemorySessionStore, DEFAULT_SWEEP_INTERVAL};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to gather entropy for a session id")]
    Entropy(#[source] rand::Error),
}

pub trait SessionStore: Send + Sync {
    /// Issue a new session id.
    ///
    /// # Errors
    /// Returns an error if the random source fails.
    fn create(&self) -> Result<String, SessionError>;

    /// Whether `session_id` was issued and has not expired yet.
    fn check(&self, session_id: &str) -> bool;
}
