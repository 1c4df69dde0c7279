//! Map validated CLI matches to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{code, ldap, logging, ARG_LISTEN, ARG_PREFIX};
use anyhow::{Context, Result};
use std::net::SocketAddr;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let listen = matches
        .get_one::<SocketAddr>(ARG_LISTEN)
        .copied()
        .context("missing required argument: --listen")?;

    let prefix = matches
        .get_one::<String>(ARG_PREFIX)
        .filter(|prefix| !prefix.is_empty())
        .cloned();

    let ldap_opts = ldap::Options::parse(matches)?;
    let code_opts = code::Options::parse(matches)?;

    Ok(Action::Server(Args {
        listen,
        prefix,
        ldap_server: ldap_opts.server,
        ldap_port: ldap_opts.port,
        ldap_base_dn: ldap_opts.base_dn,
        ldap_group: ldap_opts.group,
        ldap_security: ldap_opts.security,
        code_length: code_opts.length,
        code_interval: code_opts.interval,
        session_ttl: code_opts.session_ttl,
        debug: matches.get_flag(logging::ARG_DEBUG),
    }))
}
