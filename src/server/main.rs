use tokio::net::TcpListener;
use tracing::{error, info};

use hwid_registry::config::get_config;
use hwid_registry::server::logging::init_tracing;
use hwid_registry::server::{build_router, AppState, Database};

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
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

    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; the process environment still applies.
    dotenvy::dotenv().ok();

    let config = get_config()?;
    init_tracing(&config.logging);

    let db = Database::connect(&config.database).await?;
    db.ensure_schema().await?;

    let app = build_router(AppState::new(db.clone()));

    let listener = TcpListener::bind(config.server.bind_addr()).await?;
    info!(
        "Server is running on {} (database: {})",
        listener.local_addr()?,
        db.backend_name()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
