pub mod revoke;
pub mod sessions;
pub mod sweep;
pub mod verify;

// Internal "interpreter" for `Action`; the match lives in `run`.
mod run;

#[derive(Debug)]
pub enum Action {
    Revoke(revoke::Args),
    Sessions(sessions::Args),
    Verify(verify::Args),
    Sweep(sweep::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
