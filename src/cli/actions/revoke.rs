use crate::cli::globals::GlobalArgs;
use crate::directory::SubjectId;
use anyhow::Result;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub subject: SubjectId,
}

/// Revoke every session of a subject.
/// # Errors
/// Returns an error if the database is unreachable or the revocation fails.
pub async fn execute(args: Args) -> Result<()> {
    let service = args.globals.service().await?;
    let revoked = service.revoke_all(&args.subject).await?;
    info!(subject = %args.subject, revoked, "revoked sessions");
    println!("{revoked}");
    Ok(())
}
