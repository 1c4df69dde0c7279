pub mod code;
pub mod ldap;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};
use std::net::SocketAddr;

pub const ARG_LISTEN: &str = "listen";
pub const ARG_PREFIX: &str = "prefix";

/// Accept `HOST:PORT` or `:PORT` (all IPv4 interfaces).
fn parse_listen(value: &str) -> Result<SocketAddr, String> {
    let value = value.trim();
    let candidate = if value.starts_with(':') {
        format!("0.0.0.0{value}")
    } else {
        value.to_string()
    };

    candidate
        .parse()
        .map_err(|_| format!("invalid listen address '{value}', expected HOST:PORT or :PORT"))
}

/// URL prefix without the trailing slash; empty means no prefix.
fn parse_prefix(value: &str) -> Result<String, String> {
    let value = value.trim();
    if !value.is_empty() && !value.starts_with('/') {
        return Err(format!("prefix '{value}' must start with '/'"));
    }
    Ok(value.trim_end_matches('/').to_string())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("safeexam")
        .about("Rotating proof-of-presence codes for exam sessions")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_LISTEN)
                .short('l')
                .long(ARG_LISTEN)
                .help("Address to listen on, example: 0.0.0.0:8080 or :8080")
                .env("SAFEEXAM_LISTEN_ADDR")
                .required(true)
                .value_parser(parse_listen),
        )
        .arg(
            Arg::new(ARG_PREFIX)
                .long(ARG_PREFIX)
                .help("URL prefix the service is mounted under, example: /safeexam")
                .env("SAFEEXAM_PREFIX")
                .value_parser(parse_prefix),
        );

    let command = ldap::with_args(command);
    let command = code::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::directory::Security;

    const REQUIRED: [&str; 7] = [
        "safeexam",
        "--listen",
        "127.0.0.1:8080",
        "--ldap-server",
        "dc1.example.com",
        "--ldap-base-dn",
        "DC=example,DC=com",
    ];

    // Keep values from the developer's shell out of the assertions.
    fn with_clean_env<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        temp_env::with_vars(
            [
                ("SAFEEXAM_LISTEN_ADDR", None::<&str>),
                ("SAFEEXAM_PREFIX", None),
                ("SAFEEXAM_LDAP_SERVER", None),
                ("SAFEEXAM_LDAP_PORT", None),
                ("SAFEEXAM_LDAP_BASE_DN", None),
                ("SAFEEXAM_LDAP_GROUP", None),
                ("SAFEEXAM_LDAP_SECURITY", None),
                ("SAFEEXAM_CODE_LENGTH", None),
                ("SAFEEXAM_CODE_INTERVAL_SECONDS", None),
                ("SAFEEXAM_SESSION_TTL_SECONDS", None),
                ("SAFEEXAM_DEBUG", None),
                ("SAFEEXAM_LOG_LEVEL", None),
            ],
            f,
        )
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "safeexam");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Rotating proof-of-presence codes for exam sessions".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        with_clean_env(|| {
            let matches = new().try_get_matches_from(REQUIRED).unwrap();

            assert_eq!(
                matches.get_one::<SocketAddr>(ARG_LISTEN).copied(),
                Some(SocketAddr::from(([127, 0, 0, 1], 8080)))
            );
            assert_eq!(matches.get_one::<String>(ARG_PREFIX), None);
            assert_eq!(matches.get_one::<u16>(ldap::ARG_LDAP_PORT).copied(), Some(389));
            assert_eq!(
                matches.get_one::<Security>(ldap::ARG_LDAP_SECURITY).copied(),
                Some(Security::None)
            );
            assert_eq!(matches.get_one::<u64>(code::ARG_CODE_LENGTH).copied(), Some(3));
            assert_eq!(
                matches.get_one::<u64>(code::ARG_CODE_INTERVAL_SECONDS).copied(),
                Some(720)
            );
            assert_eq!(
                matches.get_one::<u64>(code::ARG_SESSION_TTL_SECONDS).copied(),
                Some(3600)
            );
            assert!(!matches.get_flag(logging::ARG_DEBUG));
            assert_eq!(matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(), Some(0));
        });
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("SAFEEXAM_LISTEN_ADDR", Some(":9000")),
                ("SAFEEXAM_PREFIX", Some("/exam/")),
                ("SAFEEXAM_LDAP_SERVER", Some("dc2.example.com")),
                ("SAFEEXAM_LDAP_PORT", Some("636")),
                ("SAFEEXAM_LDAP_BASE_DN", Some("DC=example,DC=com")),
                ("SAFEEXAM_LDAP_GROUP", Some("Proctors")),
                ("SAFEEXAM_LDAP_SECURITY", Some("TLS")),
                ("SAFEEXAM_CODE_LENGTH", Some("6")),
                ("SAFEEXAM_CODE_INTERVAL_SECONDS", Some("60")),
                ("SAFEEXAM_SESSION_TTL_SECONDS", Some("120")),
                ("SAFEEXAM_DEBUG", Some("true")),
                ("SAFEEXAM_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().try_get_matches_from(["safeexam"]).unwrap();

                assert_eq!(
                    matches.get_one::<SocketAddr>(ARG_LISTEN).copied(),
                    Some(SocketAddr::from(([0, 0, 0, 0], 9000)))
                );
                assert_eq!(
                    matches.get_one::<String>(ARG_PREFIX).cloned(),
                    Some("/exam".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>(ldap::ARG_LDAP_SERVER).cloned(),
                    Some("dc2.example.com".to_string())
                );
                assert_eq!(matches.get_one::<u16>(ldap::ARG_LDAP_PORT).copied(), Some(636));
                assert_eq!(
                    matches.get_one::<String>(ldap::ARG_LDAP_GROUP).cloned(),
                    Some("Proctors".to_string())
                );
                assert_eq!(
                    matches.get_one::<Security>(ldap::ARG_LDAP_SECURITY).copied(),
                    Some(Security::Tls)
                );
                assert_eq!(matches.get_one::<u64>(code::ARG_CODE_LENGTH).copied(), Some(6));
                assert!(matches.get_flag(logging::ARG_DEBUG));
                assert_eq!(matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_debug_env_falsey_values() {
        for value in ["false", "0", "no", "off", ""] {
            temp_env::with_vars(
                [
                    ("SAFEEXAM_LISTEN_ADDR", Some("127.0.0.1:8080")),
                    ("SAFEEXAM_LDAP_SERVER", Some("dc1")),
                    ("SAFEEXAM_LDAP_BASE_DN", Some("DC=example,DC=com")),
                    ("SAFEEXAM_DEBUG", Some(value)),
                ],
                || {
                    let matches = new().try_get_matches_from(["safeexam"]).unwrap();
                    assert!(!matches.get_flag(logging::ARG_DEBUG), "value {value:?}");
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        with_clean_env(|| {
            for index in 0..5 {
                let mut args: Vec<String> = REQUIRED.iter().map(ToString::to_string).collect();

                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            }
        });
    }

    #[test]
    fn test_missing_required() {
        with_clean_env(|| {
            for skip in [1, 3, 5] {
                let args: Vec<&str> = REQUIRED
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip && *i != skip + 1)
                    .map(|(_, arg)| *arg)
                    .collect();

                let result = new().try_get_matches_from(args);
                assert_eq!(
                    result.map_err(|e| e.kind()).err(),
                    Some(clap::error::ErrorKind::MissingRequiredArgument)
                );
            }
        });
    }

    #[test]
    fn test_invalid_values() {
        with_clean_env(|| {
            let cases = [
                ["--listen", "not-an-address"],
                ["--prefix", "exam"],
                ["--ldap-security", "ssl"],
                ["--code-length", "0"],
                ["--code-interval-seconds", "0"],
                ["--session-ttl-seconds", "0"],
                ["--ldap-port", "0"],
            ];

            for [flag, value] in cases {
                let mut args = REQUIRED.to_vec();
                args.extend([flag, value]);

                let result = new().try_get_matches_from(args);
                assert!(result.is_err(), "{flag} {value} should be rejected");
            }
        });
    }

    #[test]
    fn test_parse_listen() {
        assert_eq!(
            parse_listen(":8080"),
            Ok(SocketAddr::from(([0, 0, 0, 0], 8080)))
        );
        assert_eq!(
            parse_listen("[::1]:443"),
            Ok("[::1]:443".parse::<SocketAddr>().unwrap())
        );
        assert!(parse_listen("8080").is_err());
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(parse_prefix("/exam/"), Ok("/exam".to_string()));
        assert_eq!(parse_prefix("/a/b"), Ok("/a/b".to_string()));
        assert_eq!(parse_prefix("/"), Ok(String::new()));
        assert_eq!(parse_prefix(""), Ok(String::new()));
        assert!(parse_prefix("exam").is_err());
    }
}
