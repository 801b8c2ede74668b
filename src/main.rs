//! Looped CMS staff server.
//!
//! Main entry point that wires the crates together and runs the background
//! session pruning until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use looped_auth::jwt::TokenIssuer;
use looped_auth::password::{PasswordHasher, PasswordValidator};
use looped_auth::session::{MemorySessionStore, SessionStore};
use looped_core::config::AppConfig;
use looped_core::error::AppError;
use looped_core::traits::{Clock, SystemClock};
use looped_database::DatabasePool;
use looped_database::repositories::{PgSettingsRepository, PgStaffRepository, SettingsRepository};
use looped_service::{StaffPolicy, StaffService};

#[tokio::main]
async fn main() {
    let env = std::env::var("LOOPED_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = config.auth.check_secret(&env) {
        tracing::error!(error = %e, "Refusing to start");
        std::process::exit(1);
    }
    if config.auth.uses_default_secret() {
        tracing::warn!("Session tokens are signed with the placeholder secret");
    }

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Looped CMS v{}", env!("CARGO_PKG_VERSION"));

    // ── Database connection + migrations ─────────────────────────
    let db = DatabasePool::connect(&config.database).await?;
    looped_database::migration::run_migrations(db.pool()).await?;

    let staff_repo = Arc::new(PgStaffRepository::new(db.pool().clone()));
    let settings_repo = PgSettingsRepository::new(db.pool().clone());
    if !settings_repo.exists().await? {
        tracing::warn!("Site settings have not been saved yet");
    }

    // ── Auth + notifications ─────────────────────────────────────
    let sessions = Arc::new(MemorySessionStore::new(&config.session));
    let tokens = Arc::new(TokenIssuer::new(&config.auth, &config.session));
    let gateway = looped_notify::build_gateway(&config.mail)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // ── Services ─────────────────────────────────────────────────
    let staff_service = Arc::new(StaffService::new(
        staff_repo,
        sessions.clone(),
        gateway,
        Arc::new(PasswordHasher::new()),
        Arc::new(PasswordValidator::new(&config.auth)),
        tokens,
        clock.clone(),
        StaffPolicy::from_config(&config.staff)?,
    ));
    tracing::info!(policy = ?staff_service, "Staff service ready");

    // ── Background session pruning ───────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let prune_handle = tokio::spawn(prune_sessions(
        sessions,
        clock,
        Duration::from_secs(config.session.prune_interval_seconds),
        shutdown_rx,
    ));

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    if let Err(e) = prune_handle.await {
        tracing::error!(error = %e, "Session pruning task failed");
    }
    db.close().await;

    tracing::info!("Looped CMS shut down cleanly");
    Ok(())
}

/// Periodically drop lapsed sessions until shutdown is signalled.
async fn prune_sessions(
    sessions: Arc<MemorySessionStore>,
    clock: Arc<dyn Clock>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match sessions.prune(clock.now()).await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "Pruned lapsed sessions"),
                    Err(e) => tracing::warn!(error = %e, "Session pruning failed"),
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
