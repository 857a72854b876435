//! CRM API server binary.

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crm_api::logging;
use crm_api::seeder::seed_admin;
use crm_api::{router, ApiConfig, AppState};
use crm_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::load().context("invalid configuration")?;
    let _log_guard = logging::init(&config).context("failed to initialize logging")?;

    info!("Starting CRM API server...");
    info!(
        log_file = %std::path::Path::new(&config.log_dir).join(&config.log_file).display(),
        addr = %config.bind_addr(),
        database = %config.database_path,
        "Configuration loaded"
    );

    let db_config =
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections);
    let db = Database::new(db_config)
        .await
        .context("failed to open database")?;

    seed_admin(&db, &config)
        .await
        .context("failed to seed admin account")?;

    let state = AppState::new(db.clone(), config.clone());
    let cleanup = state
        .blacklist()
        .spawn_cleanup(Duration::from_secs(config.blacklist_cleanup_secs));

    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    info!(addr = %config.bind_addr(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cleanup.abort();
    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
