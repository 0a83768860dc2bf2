use crate::cli::actions::{Action, revoke, sessions, sweep, verify};
use anyhow::Result;

/// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Revoke(args) => revoke::execute(args).await,
        Action::Sessions(args) => sessions::execute(args).await,
        Action::Verify(args) => verify::execute(&args),
        Action::Sweep(args) => sweep::execute(args).await,
    }
}
