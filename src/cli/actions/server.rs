use crate::{
    api::{self, Services},
    code::RandomCodeGenerator,
    directory::{LdapAuthenticator, LdapConfig, Security},
    session::MemorySessionStore,
};
use anyhow::{Context, Result};
use std::{net::SocketAddr, num::NonZeroUsize, sync::Arc, time::Duration};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Args {
    pub listen: SocketAddr,
    pub prefix: Option<String>,
    pub ldap_server: String,
    pub ldap_port: u16,
    pub ldap_base_dn: String,
    pub ldap_group: Option<String>,
    pub ldap_security: Security,
    pub code_length: NonZeroUsize,
    pub code_interval: Duration,
    pub session_ttl: Duration,
    pub debug: bool,
}

impl Args {
    fn ldap_config(&self) -> LdapConfig {
        LdapConfig::new(self.ldap_server.clone(), self.ldap_base_dn.clone())
            .with_port(self.ldap_port)
            .with_group(self.ldap_group.clone())
            .with_security(self.ldap_security)
            .with_debug(self.debug)
    }
}

/// Build the components and serve until a shutdown signal arrives.
/// # Errors
/// Returns an error if a component cannot be built or the server fails
pub async fn execute(args: Args) -> Result<()> {
    let auth = LdapAuthenticator::new(args.ldap_config())
        .context("Invalid directory configuration")?;

    info!(
        listen = %args.listen,
        prefix = args.prefix.as_deref().unwrap_or("/"),
        ldap = %auth.url(),
        ldap_domain = auth.domain(),
        ldap_group = args.ldap_group.as_deref().unwrap_or("-"),
        code_length = args.code_length.get(),
        code_interval_seconds = args.code_interval.as_secs(),
        session_ttl_seconds = args.session_ttl.as_secs(),
        debug = args.debug,
        "starting {} {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        crate::GIT_COMMIT_HASH,
    );

    let codes = RandomCodeGenerator::new(args.code_length, args.code_interval)?;
    let sessions = MemorySessionStore::new(args.session_ttl);
    let services = Services::new(Arc::new(auth), codes, sessions);

    api::new(args.listen, args.prefix, services).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ldap_config_from_args() {
        let args = Args {
            listen: SocketAddr::from(([127, 0, 0, 1], 0)),
            prefix: None,
            ldap_server: "dc1.example.com".to_string(),
            ldap_port: 636,
            ldap_base_dn: "DC=example,DC=com".to_string(),
            ldap_group: Some("Proctors".to_string()),
            ldap_security: Security::Tls,
            code_length: NonZeroUsize::MIN,
            code_interval: Duration::from_secs(1),
            session_ttl: Duration::from_secs(1),
            debug: true,
        };

        let config = args.ldap_config();
        assert_eq!(config.group(), Some("Proctors"));
        assert_eq!(config.security(), Security::Tls);
        assert_eq!(
            config.url().map(|url| url.to_string()).ok(),
            Some("ldaps://dc1.example.com:636".to_string())
        );
    }
}
