use crate::cli::globals::GlobalArgs;
use crate::directory::SubjectId;
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub subject: SubjectId,
}

/// Print the number of live sessions of a subject.
/// # Errors
/// Returns an error if the database is unreachable.
pub async fn execute(args: Args) -> Result<()> {
    let service = args.globals.service().await?;
    let active = service.active_sessions(&args.subject).await?;
    println!("{active}");
    Ok(())
}
