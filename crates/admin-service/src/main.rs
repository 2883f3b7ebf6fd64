//! Blog Admin Service
//!
//! Entry point for the blog administration backend's authentication gate.

use admin_service::config::{Config, CredentialSource};
use admin_service::crypto::SigningKey;
use admin_service::observability::metrics::init_metrics_recorder;
use admin_service::repositories::{CredentialStore, PgCredentialStore, StaticCredentialStore};
use admin_service::routes::{self, AppState};
use admin_service::services::token_service::TokenIssuer;
use admin_service::services::token_validator::TokenValidator;
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "admin_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Blog Admin Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        access_ttl_seconds = config.access_ttl.as_secs(),
        refresh_ttl_seconds = config.refresh_ttl.as_secs(),
        "Configuration loaded successfully"
    );

    // Metrics recorder must exist before anything records
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let key = Arc::new(SigningKey::initialize(config.jwt_secret_str()).map_err(|e| {
        error!("Failed to initialize signing key: {}", e);
        e
    })?);

    let credentials: Arc<dyn CredentialStore> = match &config.credentials {
        CredentialSource::Database { url } => {
            info!("Connecting to database...");
            let db_pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(5))
                .connect(url.expose_secret())
                .await
                .map_err(|e| {
                    error!("Failed to connect to database: {}", e);
                    e
                })?;
            info!("Database connection established");
            Arc::new(PgCredentialStore::new(db_pool))
        }
        CredentialSource::Static { username, password } => {
            info!("Using static administrator credentials");
            Arc::new(StaticCredentialStore::new(username.clone(), password.clone()))
        }
    };

    let state = Arc::new(AppState {
        issuer: TokenIssuer::new(key.clone(), config.access_ttl, config.refresh_ttl),
        validator: Arc::new(TokenValidator::new(key)),
        credentials,
    });

    // Build application routes
    let app = routes::build_routes(state, metrics_handle);

    // Parse bind address
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Blog Admin Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Blog Admin Service shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
