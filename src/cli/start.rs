use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;

/// Parse arguments, install logging and build the [`Action`] to run.
///
/// # Errors
///
/// Returns an error if telemetry cannot be installed or the arguments do not
/// describe a runnable action (missing keys, bad subject id)
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();
    telemetry::init(commands::logging::level(&matches))?;
    dispatch::handler(&matches)
}
