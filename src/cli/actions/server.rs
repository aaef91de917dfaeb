use crate::{
    api,
    blocker::Blocker,
    cli::telemetry,
    config::{BlockerConfig, HashConfig, PasswordConfig},
    domain::SystemClock,
    hasher::Argon2Hasher,
    password::PasswordService,
    repeater,
    store::PgStore,
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{debug, error, info};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: SecretString,
    pub db_max_connections: u32,
    pub password: PasswordConfig,
    pub blocker: BlockerConfig,
    pub hash: HashConfig,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable, migrations fail, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Connecting to database: {}", redact_dsn(args.dsn.expose_secret()));

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(args.db_max_connections)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(args.dsn.expose_secret())
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let hasher = Arc::new(Argon2Hasher::new(&args.hash).context("Invalid hash parameters")?);
    let blocker = Arc::new(Blocker::new(store.clone()));
    let service = Arc::new(PasswordService::new(
        store.clone(),
        hasher,
        blocker.clone(),
        Arc::new(SystemClock),
        args.password,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let repeater = repeater::spawn(blocker, args.blocker, shutdown_rx.clone());

    let signal_tx = Arc::clone(&shutdown_tx);
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_tx.send_replace(true);
    });

    let served = api::new(args.port, pool, service, store, shutdown_rx).await;

    // Stop the repeater even if the server failed; pending ids are not flushed.
    shutdown_tx.send_replace(true);
    if let Err(e) = repeater.await {
        error!("Repeater task failed: {}", e);
    }

    telemetry::shutdown_tracer();

    served
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("SIGINT received, shutting down"),
        () = terminate => info!("SIGTERM received, shutting down"),
    }
}

/// DSN with its password masked, for logs.
fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => "<invalid dsn>".to_string(),
    }
}
