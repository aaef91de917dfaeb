use crate::config::DEFAULT_HASH_SALT;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_HASH_SALT: &str = "hash-salt";
pub const ARG_HASH_MEMORY_KIB: &str = "hash-memory-kib";
pub const ARG_HASH_ITERATIONS: &str = "hash-iterations";

#[derive(Debug, Clone)]
pub struct Options {
    pub salt: SecretString,
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Options {
    /// # Errors
    /// Returns an error if a value is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let salt = matches
            .get_one::<String>(ARG_HASH_SALT)
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --hash-salt")?;
        let memory_kib = matches
            .get_one::<u32>(ARG_HASH_MEMORY_KIB)
            .copied()
            .context("missing required argument: --hash-memory-kib")?;
        let iterations = matches
            .get_one::<u32>(ARG_HASH_ITERATIONS)
            .copied()
            .context("missing required argument: --hash-iterations")?;

        Ok(Self {
            salt,
            memory_kib,
            iterations,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_HASH_SALT)
                .long(ARG_HASH_SALT)
                .help("Static salt mixed into every password hash")
                .long_help(
                    "Static salt mixed into every password hash. Changing it invalidates every stored password.",
                )
                .env("PASSWORDS_HASH_SALT")
                .hide_env_values(true)
                .default_value(DEFAULT_HASH_SALT),
        )
        .arg(
            Arg::new(ARG_HASH_MEMORY_KIB)
                .long(ARG_HASH_MEMORY_KIB)
                .help("Argon2id memory cost in KiB")
                .env("PASSWORDS_HASH_MEMORY_KIB")
                .default_value("19456")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_HASH_ITERATIONS)
                .long(ARG_HASH_ITERATIONS)
                .help("Argon2id iterations")
                .env("PASSWORDS_HASH_ITERATIONS")
                .default_value("2")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
}
