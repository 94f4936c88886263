//! Travel Checkout - API Server Binary
//!
//! Starts the HTTP API for the travel insurance checkout.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin checkout-api
//!
//! # Run with environment variables
//! API_PORT=9000 API_DATABASE_URL=postgres://... API_ADMIN_PASSWORD=... cargo run --bin checkout-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - Listen address (default: 0.0.0.0:8080)
//! * `API_JWT_SECRET` - Admin token signing secret (required in production)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_GATEWAY_URL`, `API_VERIFICATION_URL`, `API_INSURER_URL` - External service base URLs
//! * `API_INSURER_API_KEY` - Sent to the insurer as `x-api-key`
//! * `API_TAX_RATE_PERCENT` - Tax included in quoted amounts (default: 16)
//! * `API_ADMIN_USERNAME` / `API_ADMIN_PASSWORD` - Back-office login; empty password disables it
//! * `API_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::HealthCheckable;
use domain_checkout::InMemoryTransientStore;
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresEnquiryStore, PostgresPolicyRecordStore};
use infra_http::{GatewayClient, HttpServiceConfig, InsurerClient, PaymentVerificationClient};
use interface_api::{config::ApiConfig, create_router, Adapters, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        tax_rate_percent = %config.tax_rate_percent,
        "Starting travel checkout API server"
    );
    if config.admin_password.is_empty() {
        tracing::warn!("API_ADMIN_PASSWORD is not set; admin login is disabled");
    }

    let state = build_state(config.clone()).await?;
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Connects the database and external clients and wires the handlers.
async fn build_state(config: ApiConfig) -> anyhow::Result<AppState> {
    let pool = create_pool(
        DatabaseConfig::new(&config.database_url).max_connections(config.database_max_connections),
    )
    .await
    .context("connecting to the database")?;
    run_migrations(&pool).await.context("running database migrations")?;

    let records = Arc::new(PostgresPolicyRecordStore::new(pool.clone()));
    let enquiries = Arc::new(PostgresEnquiryStore::new(pool));

    let timeout = config.http_timeout();
    let gateway = GatewayClient::new(HttpServiceConfig::new(&config.gateway_url).with_timeout(timeout))
        .context("configuring the payment gateway client")?;
    let verifier =
        PaymentVerificationClient::new(HttpServiceConfig::new(&config.verification_url).with_timeout(timeout))
            .context("configuring the payment verification client")?;
    let issuer = InsurerClient::new(
        HttpServiceConfig::new(&config.insurer_url)
            .with_timeout(timeout)
            .with_api_key(config.insurer_api_key.clone()),
    )
    .context("configuring the insurer client")?;

    let adapters = Adapters {
        gateway: Arc::new(gateway),
        verifier: Arc::new(verifier),
        issuer: Arc::new(issuer),
        records: records.clone(),
        enquiries: enquiries.clone(),
        sessions: Arc::new(InMemoryTransientStore::new(config.session_ttl())),
        readiness: vec![
            records as Arc<dyn HealthCheckable>,
            enquiries as Arc<dyn HealthCheckable>,
        ],
    };

    Ok(AppState::new(config, adapters))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
