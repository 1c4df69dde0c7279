use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;

/// Map verbosity count to tracing level; `--debug` raises it to at least DEBUG.
const fn get_verbosity_level(verbosity: u8, debug: bool) -> Option<tracing::Level> {
    let verbosity = if debug && verbosity < 3 { 3 } else { verbosity };

    match verbosity {
        0 => None,
        1 => Some(tracing::Level::WARN),
        2 => Some(tracing::Level::INFO),
        3 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    }
}

/// Main entry point for the CLI - builds and returns the Action
///
/// # Errors
///
/// Returns an error if telemetry initialization or action dispatch fails
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let verbosity_level = get_verbosity_level(
        matches
            .get_one::<u8>(commands::logging::ARG_VERBOSITY)
            .copied()
            .unwrap_or(0),
        matches.get_flag(commands::logging::ARG_DEBUG),
    );

    telemetry::init(verbosity_level)?;

    dispatch::handler(&matches)
}
