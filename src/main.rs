use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::limit::RequestBodyLimitLayer;

use rust_simulador_api::backend::SharedBackend;
use rust_simulador_api::config::Config;
use rust_simulador_api::handlers::{self, AppState, BODY_LIMIT};
use rust_simulador_api::obs;
use rust_simulador_api::supabase_client::SupabaseClient;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, builds the hosted backend
/// client, wires the HTTP routes with their middleware and starts the Axum
/// server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    obs::init_tracing();

    let config = Config::from_env()?;

    let client = SupabaseClient::from_config(&config)?;
    tracing::info!("✓ Backend client initialized: {}", config.supabase_url);
    let backend: SharedBackend = Arc::new(client);

    let app_state = Arc::new(AppState::new(config.clone(), backend)?);

    // Rate limiter: 5 requests/second per IP, burst of 10
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(5)
            .burst_size(10)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let api = handlers::api_routes().layer(
        ServiceBuilder::new()
            .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    let app = handlers::app(app_state, api);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
