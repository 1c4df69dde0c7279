use clap::{Arg, ArgMatches, Command};
use std::{num::NonZeroUsize, time::Duration};

pub const ARG_CODE_LENGTH: &str = "code-length";
pub const ARG_CODE_INTERVAL_SECONDS: &str = "code-interval-seconds";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub length: NonZeroUsize,
    pub interval: Duration,
    pub session_ttl: Duration,
}

impl Options {
    /// Parse code rotation and session arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a value is missing or zero.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_positive = |id: &str| -> anyhow::Result<u64> {
            matches
                .get_one::<u64>(id)
                .copied()
                .filter(|v| *v > 0)
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        let length = usize::try_from(read_positive(ARG_CODE_LENGTH)?)?;

        Ok(Self {
            length: NonZeroUsize::new(length)
                .ok_or_else(|| anyhow::anyhow!("--{ARG_CODE_LENGTH} must be at least 1"))?,
            interval: Duration::from_secs(read_positive(ARG_CODE_INTERVAL_SECONDS)?),
            session_ttl: Duration::from_secs(read_positive(ARG_SESSION_TTL_SECONDS)?),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CODE_LENGTH)
                .long(ARG_CODE_LENGTH)
                .help("Number of characters in a code")
                .env("SAFEEXAM_CODE_LENGTH")
                .default_value("3")
                .value_parser(clap::value_parser!(u64).range(1..=1024)),
        )
        .arg(
            Arg::new(ARG_CODE_INTERVAL_SECONDS)
                .long(ARG_CODE_INTERVAL_SECONDS)
                .help("Seconds between code rotations")
                .env("SAFEEXAM_CODE_INTERVAL_SECONDS")
                .default_value("720")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Seconds a session stays valid after login")
                .env("SAFEEXAM_SESSION_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
