use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

pub const ARG_PASSWORD_LIFETIME_SECONDS: &str = "password-lifetime-seconds";
pub const ARG_BLOCKER_INTERVAL_SECONDS: &str = "blocker-interval-seconds";

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub lifetime_seconds: i64,
    pub blocker_interval_seconds: u64,
}

impl Options {
    /// # Errors
    /// Returns an error if a value is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let lifetime_seconds = matches
            .get_one::<i64>(ARG_PASSWORD_LIFETIME_SECONDS)
            .copied()
            .context("missing required argument: --password-lifetime-seconds")?;
        let blocker_interval_seconds = matches
            .get_one::<u64>(ARG_BLOCKER_INTERVAL_SECONDS)
            .copied()
            .context("missing required argument: --blocker-interval-seconds")?;

        Ok(Self {
            lifetime_seconds,
            blocker_interval_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PASSWORD_LIFETIME_SECONDS)
                .long(ARG_PASSWORD_LIFETIME_SECONDS)
                .help("Lifetime of a password added without an explicit expiry, in seconds")
                .env("PASSWORDS_PASSWORD_LIFETIME_SECONDS")
                .default_value("62208000")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_BLOCKER_INTERVAL_SECONDS)
                .long(ARG_BLOCKER_INTERVAL_SECONDS)
                .help("Seconds between bulk disables of expired and used passwords")
                .env("PASSWORDS_BLOCKER_INTERVAL_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64)),
        )
}
