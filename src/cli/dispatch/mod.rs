//! Maps validated CLI arguments to an [`Action`] with resolved configuration.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_DB_MAX_CONNECTIONS, ARG_DSN, ARG_PORT, hash, password};
use crate::config::{BlockerConfig, HashConfig, PasswordConfig};
use anyhow::{Context, Result};
use secrecy::SecretString;
use url::Url;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or out of range.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;

    Url::parse(&dsn).context("invalid PASSWORDS_DSN")?;

    let db_max_connections = matches
        .get_one::<u32>(ARG_DB_MAX_CONNECTIONS)
        .copied()
        .unwrap_or(5);

    let password_opts = password::Options::parse(matches)?;
    let hash_opts = hash::Options::parse(matches)?;

    let password = PasswordConfig::new()
        .with_lifetime_seconds(password_opts.lifetime_seconds)
        .context("password lifetime is out of range")?;

    let blocker = BlockerConfig::new()
        .with_interval_seconds(password_opts.blocker_interval_seconds)
        .normalize();

    let hash = HashConfig::new()
        .with_salt(hash_opts.salt)
        .with_memory_kib(hash_opts.memory_kib)
        .with_iterations(hash_opts.iterations);

    Ok(Action::Server(Args {
        port,
        dsn: SecretString::from(dsn),
        db_max_connections,
        password,
        blocker,
        hash,
    }))
}
