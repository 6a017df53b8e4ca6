use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;

/// Map `-v` repetitions to a tracing level; zero keeps logging off.
const fn verbosity_level(count: u8) -> Option<tracing::Level> {
    match count {
        0 => None,
        1 => Some(tracing::Level::WARN),
        2 => Some(tracing::Level::INFO),
        3 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    }
}

/// Parse the command line, bring up logging, and resolve the [`Action`] the
/// binary should execute.
///
/// # Errors
///
/// Returns an error if telemetry fails to initialize or the arguments do not
/// dispatch to an action.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let verbosity = matches
        .get_one::<u8>(commands::logging::ARG_VERBOSITY)
        .copied()
        .unwrap_or(0);
    telemetry::init(verbosity_level(verbosity))?;

    dispatch::handler(&matches)
}

#[cfg(test)]
mod tests {
    use super::verbosity_level;
    use tracing::Level;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(verbosity_level(0), None);
        assert_eq!(verbosity_level(1), Some(Level::WARN));
        assert_eq!(verbosity_level(2), Some(Level::INFO));
        assert_eq!(verbosity_level(3), Some(Level::DEBUG));
        assert_eq!(verbosity_level(4), Some(Level::TRACE));
        assert_eq!(verbosity_level(255), Some(Level::TRACE));
    }
}
