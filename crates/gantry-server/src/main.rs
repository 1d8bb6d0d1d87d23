//! Gantry Template Service - Main Server

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

use crate::config::Settings;
use gantry_api::AppState;
use gantry_api::auth::JwtService;
use gantry_db::{create_pool, DatabaseConfig};
use gantry_scm::{ScmClient, ScmConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;

    info!(
        "Starting Gantry Template Service v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Configuration loaded successfully");

    // Initialize services
    let state = initialize_services(&settings).await?;

    // Create API router with state
    let app = create_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gantry=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

async fn initialize_services(settings: &Settings) -> Result<AppState> {
    // Initialize database connection pool
    info!("Connecting to PostgreSQL...");
    let db_config = DatabaseConfig {
        url: settings.database.url.clone(),
        max_connections: settings.database.max_connections,
        min_connections: 2,
        acquire_timeout_secs: 30,
        idle_timeout_secs: 600,
    };

    let db_pool = create_pool(&db_config)
        .await
        .context("Failed to connect to PostgreSQL")?;
    info!("PostgreSQL connection established");

    // Initialize SCM connector client
    info!("Configuring SCM connector at {}...", settings.scm.endpoint);
    let scm_config = ScmConfig {
        endpoint: settings.scm.endpoint.clone(),
        token: settings.scm.token.clone(),
        ..Default::default()
    };
    let scm_client = ScmClient::new(scm_config).context("Failed to create SCM client")?;

    match scm_client.health_check().await {
        Ok(true) => info!("SCM connector reachable"),
        Ok(false) | Err(_) => {
            // Degraded start: user-scope permission checks will fail until
            // the connector comes back
            warn!("SCM connector not reachable at startup");
        }
    }

    // Create JWT service
    let jwt_service = JwtService::new(
        settings.jwt.secret.clone(),
        settings.jwt.issuer.clone(),
        settings.jwt.token_expiry_secs,
    );

    // Create application state
    let state = AppState::new(db_pool, scm_client, jwt_service);

    info!("All services initialized successfully");
    Ok(state)
}

fn create_app(state: AppState) -> Router {
    let app = gantry_api::create_router_with_state(state);

    app.layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
