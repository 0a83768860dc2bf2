//! Map validated CLI matches to an [`Action`].
//!
//! Keys and database settings are only demanded by the subcommands that
//! need them: `verify` never connects, `sweep` never signs.

use crate::cli::actions::{Action, revoke, sessions, sweep, verify};
use crate::cli::commands::{
    self, ARG_DSN, ARG_INTERVAL_SECONDS, ARG_SUBJECT, ARG_TOKEN, credentials, keys,
};
use crate::cli::globals::GlobalArgs;
use crate::directory::SubjectId;
use anyhow::{Context, Result, anyhow};
use secrecy::SecretString;
use std::time::Duration;

fn dsn(matches: &clap::ArgMatches) -> Result<SecretString> {
    matches
        .get_one::<String>(ARG_DSN)
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --dsn")
}

fn subject(matches: &clap::ArgMatches) -> Result<SubjectId> {
    let raw = matches
        .get_one::<String>(ARG_SUBJECT)
        .cloned()
        .context("missing required argument: --subject")?;
    SubjectId::parse(raw).context("invalid --subject")
}

fn globals(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let keys = keys::Options::parse(matches)?.signing_keys()?;
    let config = credentials::Options::parse(matches)?.credential_config();
    Ok(GlobalArgs::new(dsn(matches)?, keys, config))
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((commands::CMD_REVOKE, sub)) => Ok(Action::Revoke(revoke::Args {
            globals: globals(sub)?,
            subject: subject(sub)?,
        })),
        Some((commands::CMD_SESSIONS, sub)) => Ok(Action::Sessions(sessions::Args {
            globals: globals(sub)?,
            subject: subject(sub)?,
        })),
        Some((commands::CMD_VERIFY, sub)) => Ok(Action::Verify(verify::Args {
            keys: keys::Options::parse(sub)?.signing_keys()?,
            token: sub
                .get_one::<String>(ARG_TOKEN)
                .cloned()
                .map(SecretString::from)
                .context("missing required argument: --token")?,
        })),
        Some((commands::CMD_SWEEP, sub)) => Ok(Action::Sweep(sweep::Args {
            dsn: dsn(sub)?,
            interval: sub
                .get_one::<u64>(ARG_INTERVAL_SECONDS)
                .copied()
                .map(Duration::from_secs),
        })),
        Some((name, _)) => Err(anyhow!("unknown subcommand: {name}")),
        None => Err(anyhow!("missing subcommand")),
    }
}
