use anyhow::{Result, bail};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::session::SigningKeys;

pub const ARG_ACCESS_SIGNING_KEY: &str = "access-signing-key";
pub const ARG_REFRESH_SIGNING_KEY: &str = "refresh-signing-key";

#[derive(Debug, Clone)]
pub struct Options {
    pub access: SecretString,
    pub refresh: SecretString,
}

impl Options {
    /// Parse both signing keys from matches.
    ///
    /// # Errors
    /// Returns an error if either key is missing or blank.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let Some(access) = get_non_empty(ARG_ACCESS_SIGNING_KEY) else {
            bail!("missing required argument: --{ARG_ACCESS_SIGNING_KEY}");
        };
        let Some(refresh) = get_non_empty(ARG_REFRESH_SIGNING_KEY) else {
            bail!("missing required argument: --{ARG_REFRESH_SIGNING_KEY}");
        };

        Ok(Self {
            access: SecretString::from(access),
            refresh: SecretString::from(refresh),
        })
    }

    /// # Errors
    /// Returns an error if a key is rejected by [`SigningKeys::new`].
    pub fn signing_keys(self) -> Result<SigningKeys> {
        Ok(SigningKeys::new(self.access, self.refresh)?)
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ACCESS_SIGNING_KEY)
                .long(ARG_ACCESS_SIGNING_KEY)
                .help("HMAC key for access credentials")
                .env("TESSERA_ACCESS_SIGNING_KEY")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_REFRESH_SIGNING_KEY)
                .long(ARG_REFRESH_SIGNING_KEY)
                .help("HMAC key for refresh credentials")
                .env("TESSERA_REFRESH_SIGNING_KEY")
                .hide_env_values(true)
                .global(true),
        )
}
