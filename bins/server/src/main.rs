//! Facture API Server
//!
//! Main entry point for the Facture backend service. Runs the HTTP
//! server and the periodic overdue sweeper.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use facture_api::{AppState, create_router};
use facture_db::{InvoiceRepository, connect};
use facture_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facture=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Spawn the overdue sweeper: every tick, SENT invoices past their
    // due date flip to OVERDUE.
    let sweeper_repo = InvoiceRepository::new(db.clone());
    let sweep_interval = Duration::from_secs(config.sweeper.interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            match sweeper_repo.mark_overdue(Utc::now().date_naive()).await {
                Ok(0) => {}
                Ok(count) => info!(count, "Marked invoices overdue"),
                Err(e) => error!(error = %e, "Overdue sweep failed"),
            }
        }
    });
    info!(interval_secs = config.sweeper.interval_secs, "Overdue sweeper started");

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
