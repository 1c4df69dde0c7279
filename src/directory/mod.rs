//! Credential gate.
//!
//! `Ok(false)` means the directory answered and said no: wrong password, unknown
//! user, or a user outside the required group. `Err(_)` means the directory could
//! not give an answer at all. Callers map the two to different outcomes.

mod ldap;

pub use ldap::{LdapAuthenticator, LdapConfig, Security, DEFAULT_LDAP_PORT};

use async_trait::async_trait;
use secrecy::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to connect to {url}")]
    Connect {
        url: String,
        #[source]
        source: ldap3::LdapError,
    },

    #[error("bind rejected with result code {rc}: {text}")]
    Bind { rc: u32, text: String },

    #[error("group membership lookup failed")]
    Search(#[source] ldap3::LdapError),

    #[error(transparent)]
    Protocol(#[from] ldap3::LdapError),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Check `username`/`password` against the directory.
    ///
    /// # Errors
    /// Returns an error if the directory could not be reached or answered with
    /// something other than success or invalid credentials.
    async fn login(&self, username: &str, password: &SecretString) -> Result<bool, DirectoryError>;
}
