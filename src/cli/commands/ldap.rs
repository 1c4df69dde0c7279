use crate::directory::{Security, DEFAULT_LDAP_PORT};
use clap::{Arg, ArgMatches, Command};

pub const ARG_LDAP_SERVER: &str = "ldap-server";
pub const ARG_LDAP_PORT: &str = "ldap-port";
pub const ARG_LDAP_BASE_DN: &str = "ldap-base-dn";
pub const ARG_LDAP_GROUP: &str = "ldap-group";
pub const ARG_LDAP_SECURITY: &str = "ldap-security";

#[derive(Debug, Clone)]
pub struct Options {
    pub server: String,
    pub port: u16,
    pub base_dn: String,
    pub group: Option<String>,
    pub security: Security,
}

impl Options {
    /// Parse directory arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_required = |id: &str| -> anyhow::Result<String> {
            matches
                .get_one::<String>(id)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            server: read_required(ARG_LDAP_SERVER)?,
            port: matches
                .get_one::<u16>(ARG_LDAP_PORT)
                .copied()
                .unwrap_or(DEFAULT_LDAP_PORT),
            base_dn: read_required(ARG_LDAP_BASE_DN)?,
            group: matches
                .get_one::<String>(ARG_LDAP_GROUP)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            security: matches
                .get_one::<Security>(ARG_LDAP_SECURITY)
                .copied()
                .unwrap_or_default(),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_LDAP_SERVER)
                .long(ARG_LDAP_SERVER)
                .help("Directory server host name or address")
                .env("SAFEEXAM_LDAP_SERVER")
                .required(true),
        )
        .arg(
            Arg::new(ARG_LDAP_PORT)
                .long(ARG_LDAP_PORT)
                .help("Directory server port")
                .env("SAFEEXAM_LDAP_PORT")
                .default_value("389")
                .value_parser(clap::value_parser!(u16).range(1..)),
        )
        .arg(
            Arg::new(ARG_LDAP_BASE_DN)
                .long(ARG_LDAP_BASE_DN)
                .help("Base DN, example: OU=Staff,DC=example,DC=com")
                .long_help(
                    "Base DN searched for group membership. Its DC= components also give the logon domain, DC=example,DC=com binds users as user@example.com.",
                )
                .env("SAFEEXAM_LDAP_BASE_DN")
                .required(true),
        )
        .arg(
            Arg::new(ARG_LDAP_GROUP)
                .long(ARG_LDAP_GROUP)
                .help("Only accept members of this group (CN or full DN)")
                .env("SAFEEXAM_LDAP_GROUP"),
        )
        .arg(
            Arg::new(ARG_LDAP_SECURITY)
                .long(ARG_LDAP_SECURITY)
                .help("Transport security: none, tls, starttls")
                .env("SAFEEXAM_LDAP_SECURITY")
                .default_value("none")
                .value_parser(|value: &str| value.parse::<Security>()),
        )
}
