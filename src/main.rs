use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proposal_review::audit::{AuditLogger, AuditSink, TracingAuditSink};
use proposal_review::auth::{DatabaseSessionVerifier, RemoteSessionVerifier, SessionVerifier};
use proposal_review::config::{AppConfig, AuthMode};
use proposal_review::database::Database;
use proposal_review::error::ReviewError;
use proposal_review::gateway::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proposal_review=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting proposal review service");

    let config = AppConfig::load()?;
    info!("Configuration loaded");

    let database = Database::new(&config.database_url).await?;
    info!("Database connected");

    database.run_migrations().await?;
    info!("Database migrations completed");

    let sessions: Arc<dyn SessionVerifier> = match config.auth.mode {
        AuthMode::Database => Arc::new(DatabaseSessionVerifier::new(database.clone())),
        AuthMode::Remote => {
            let url = config.auth.url.clone().ok_or_else(|| {
                ReviewError::ConfigError("auth.url is required in remote mode".to_string())
            })?;
            Arc::new(RemoteSessionVerifier::new(
                url,
                config.auth.anon_key.clone(),
                database.clone(),
            ))
        }
    };
    info!("Session verification: {:?}", config.auth.mode);

    let audit: Arc<dyn AuditSink> = if config.audit.enabled {
        Arc::new(AuditLogger::new(database.clone()).await?)
    } else {
        warn!("Audit trail disabled; votes will only be logged");
        Arc::new(TracingAuditSink)
    };

    if config.allows_any_origin() {
        warn!("CORS allows any origin");
    }

    let address = config.bind_address();
    let state = AppState::new(config, database, sessions, audit);
    let app = gateway::router(state)?;

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Server listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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
