mod config;
mod errors;
mod models;
mod patch;
mod routes;
mod state;
mod storage;
mod validate;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::BehaviorVersion;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::dynamo::DynamoStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize DynamoDB
    let client = build_dynamo_client(&config).await;
    info!(table = %config.users_table, "DynamoDB client initialized");

    let store = Arc::new(DynamoStore::new(client, config.users_table.clone()));

    // Build app state
    let state = AppState { store };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs a DynamoDB client, pointed at a local endpoint when
/// `DYNAMO_ENDPOINT` is configured (dynamodb-local) or at AWS otherwise.
async fn build_dynamo_client(config: &Config) -> aws_sdk_dynamodb::Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(endpoint) = &config.dynamo_endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let aws_config = loader.load().await;
    aws_sdk_dynamodb::Client::new(&aws_config)
}
