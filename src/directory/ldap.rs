use super::{Authenticator, DirectoryError};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ldap3::{ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, str::FromStr, time::Duration};
use tracing::{debug, instrument, warn};
use url::Url;

pub const DEFAULT_LDAP_PORT: u16 = 389;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

// LDAP result code invalidCredentials (RFC 4511).
const RC_INVALID_CREDENTIALS: u32 = 49;

const MEMBER_OF: &str = "memberOf";

/// Transport security towards the directory server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Security {
    #[default]
    None,
    Tls,
    StartTls,
}

impl Security {
    fn scheme(self) -> &'static str {
        match self {
            Self::Tls => "ldaps",
            Self::None | Self::StartTls => "ldap",
        }
    }
}

impl FromStr for Security {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "tls" => Ok(Self::Tls),
            "starttls" => Ok(Self::StartTls),
            _ => Err(format!(
                "invalid security mode '{s}', expected one of: none, tls, starttls"
            )),
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Tls => "tls",
            Self::StartTls => "starttls",
        })
    }
}

#[derive(Clone, Debug)]
pub struct LdapConfig {
    server: String,
    port: u16,
    base_dn: String,
    group: Option<String>,
    security: Security,
    debug: bool,
    connect_timeout: Duration,
    operation_timeout: Duration,
}

impl LdapConfig {
    #[must_use]
    pub fn new(server: String, base_dn: String) -> Self {
        Self {
            server,
            port: DEFAULT_LDAP_PORT,
            base_dn,
            group: None,
            security: Security::None,
            debug: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = group.filter(|group| !group.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Upper bound for each bind and search round trip.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[must_use]
    pub fn security(&self) -> Security {
        self.security
    }

    /// Directory URL for the configured server, port and security mode.
    ///
    /// # Errors
    /// Returns an error if the server does not form a valid URL host.
    pub fn url(&self) -> Result<Url> {
        let raw = format!("{}://{}:{}", self.security.scheme(), self.server, self.port);
        let url = Url::parse(&raw).with_context(|| format!("Invalid LDAP server: {raw}"))?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(anyhow!("LDAP server must include a host: {raw}"));
        }
        Ok(url)
    }

    /// DNS domain derived from the `DC=` components of the base DN.
    ///
    /// `OU=Staff,DC=example,DC=com` gives `example.com`.
    #[must_use]
    pub fn domain(&self) -> Option<String> {
        let labels: Vec<&str> = self
            .base_dn
            .split(',')
            .filter_map(|rdn| {
                let (attr, value) = rdn.split_once('=')?;
                let value = value.trim();
                (attr.trim().eq_ignore_ascii_case("dc") && !value.is_empty()).then_some(value)
            })
            .collect();

        if labels.is_empty() {
            None
        } else {
            Some(labels.join("."))
        }
    }

    fn settings(&self) -> LdapConnSettings {
        LdapConnSettings::new()
            .set_conn_timeout(self.connect_timeout)
            .set_starttls(self.security == Security::StartTls)
    }
}

/// Active Directory backed [`Authenticator`].
///
/// Opens one connection per login, binds as `user@domain`, optionally checks
/// `memberOf` and unbinds.
#[derive(Debug)]
pub struct LdapAuthenticator {
    config: LdapConfig,
    url: Url,
    domain: String,
}

impl LdapAuthenticator {
    /// # Errors
    /// Returns an error if the server does not form a valid URL or the base DN
    /// has no `DC=` components to derive the logon domain from.
    pub fn new(config: LdapConfig) -> Result<Self> {
        let url = config.url()?;
        let domain = config
            .domain()
            .ok_or_else(|| anyhow!("Base DN has no DC components: {}", config.base_dn))?;

        Ok(Self {
            config,
            url,
            domain,
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// User principal name used for the bind.
    fn upn(&self, username: &str) -> String {
        if username.contains('@') {
            username.to_string()
        } else {
            format!("{username}@{}", self.domain)
        }
    }

    async fn verify(
        &self,
        ldap: &mut Ldap,
        upn: &str,
        password: &SecretString,
    ) -> Result<bool, DirectoryError> {
        let bind = ldap
            .with_timeout(self.config.operation_timeout)
            .simple_bind(upn, password.expose_secret())
            .await?;

        match bind.rc {
            0 => {}
            RC_INVALID_CREDENTIALS => {
                if self.config.debug {
                    debug!("bind rejected for {}", upn);
                }
                return Ok(false);
            }
            rc => {
                return Err(DirectoryError::Bind {
                    rc,
                    text: bind.text,
                });
            }
        }

        if self.config.debug {
            debug!("bind succeeded for {}", upn);
        }

        let Some(group) = self.config.group.as_deref() else {
            return Ok(true);
        };

        let groups = self.member_of(ldap, upn).await?;
        let member = is_member(&groups, group);

        if self.config.debug {
            debug!(
                "{} is {}a member of {}",
                upn,
                if member { "" } else { "not " },
                group
            );
        }

        Ok(member)
    }

    async fn member_of(&self, ldap: &mut Ldap, upn: &str) -> Result<Vec<String>, DirectoryError> {
        let filter = format!("(userPrincipalName={})", ldap_escape(upn));

        if self.config.debug {
            debug!("searching {} with {}", self.config.base_dn, filter);
        }

        let (entries, _) = ldap
            .with_timeout(self.config.operation_timeout)
            .search(&self.config.base_dn, Scope::Subtree, &filter, vec![MEMBER_OF])
            .await
            .and_then(ldap3::SearchResult::success)
            .map_err(DirectoryError::Search)?;

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .flat_map(|entry| {
                entry
                    .attrs
                    .into_iter()
                    .filter(|(attr, _)| attr.eq_ignore_ascii_case(MEMBER_OF))
                    .flat_map(|(_, values)| values)
            })
            .collect())
    }
}

#[async_trait]
impl Authenticator for LdapAuthenticator {
    #[instrument(skip_all)]
    async fn login(&self, username: &str, password: &SecretString) -> Result<bool, DirectoryError> {
        // An empty password would turn the simple bind into an anonymous bind.
        if username.trim().is_empty() || password.expose_secret().is_empty() {
            return Ok(false);
        }

        let upn = self.upn(username);

        let (conn, mut ldap) = LdapConnAsync::with_settings(self.config.settings(), self.url.as_str())
            .await
            .map_err(|source| DirectoryError::Connect {
                url: self.url.to_string(),
                source,
            })?;

        tokio::spawn(async move {
            if let Err(err) = conn.drive().await {
                warn!("LDAP connection error: {}", err);
            }
        });

        let outcome = self.verify(&mut ldap, &upn, password).await;

        if let Err(err) = ldap
            .with_timeout(self.config.operation_timeout)
            .unbind()
            .await
        {
            debug!("LDAP unbind failed: {}", err);
        }

        outcome
    }
}

/// Whether any `memberOf` value names `group`, either as the full DN or as the
/// leading `CN=` of the DN.
fn is_member(member_of: &[String], group: &str) -> bool {
    let group = group.trim();
    member_of.iter().any(|dn| {
        dn.trim().eq_ignore_ascii_case(group)
            || common_name(dn).is_some_and(|cn| cn.eq_ignore_ascii_case(group))
    })
}

fn common_name(dn: &str) -> Option<&str> {
    let (attr, value) = dn.split(',').next()?.split_once('=')?;
    attr.trim()
        .eq_ignore_ascii_case("cn")
        .then_some(value.trim())
}
