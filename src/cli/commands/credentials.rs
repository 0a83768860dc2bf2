use anyhow::Result;
use clap::{Arg, ArgMatches, Command};

use crate::session::CredentialConfig;

pub const ARG_ACCESS_TTL_SECONDS: &str = "access-ttl-seconds";
pub const ARG_REFRESH_TTL_SECONDS: &str = "refresh-ttl-seconds";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";

#[derive(Debug, Clone)]
pub struct Options {
    pub access_ttl_seconds: u64,
    pub refresh_ttl_seconds: u64,
    pub frontend_base_url: String,
}

impl Options {
    /// # Errors
    /// Returns an error if a defaulted argument is somehow absent.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let ttl = |id: &str| {
            matches
                .get_one::<u64>(id)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };
        Ok(Self {
            access_ttl_seconds: ttl(ARG_ACCESS_TTL_SECONDS)?,
            refresh_ttl_seconds: ttl(ARG_REFRESH_TTL_SECONDS)?,
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn credential_config(self) -> CredentialConfig {
        CredentialConfig::new()
            .with_access_ttl_seconds(self.access_ttl_seconds)
            .with_refresh_ttl_seconds(self.refresh_ttl_seconds)
            .with_frontend_base_url(self.frontend_base_url)
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ACCESS_TTL_SECONDS)
                .long(ARG_ACCESS_TTL_SECONDS)
                .help("Access credential lifetime in seconds")
                .env("TESSERA_ACCESS_TTL_SECONDS")
                .default_value("900")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TTL_SECONDS)
                .long(ARG_REFRESH_TTL_SECONDS)
                .help("Refresh credential lifetime in seconds")
                .env("TESSERA_REFRESH_TTL_SECONDS")
                .default_value("604800")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL used for password reset links")
                .env("TESSERA_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000")
                .global(true),
        )
}
