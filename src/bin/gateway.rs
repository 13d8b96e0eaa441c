// ============================================================================
// API Gateway Service
// ============================================================================
//
// Single public entry point. Authenticates once per request, forwards
// the verified identity to internal services as a trusted header, and
// proxies by path prefix. Stateless; scales horizontally.
//
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staybook_server::auth_client::AuthClient;
use staybook_server::config::Config;
use staybook_server::gateway::{self, GatewayState, ServiceClient};
use staybook_server::routes::health::health_check;
use staybook_server::routes::middleware::request_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== API Gateway Starting ===");
    info!("Port: {}", config.port);
    info!("Auth transport: {}", config.auth_transport.as_str());

    let auth_client = Arc::new(AuthClient::from_config(&config).await?);
    let state = Arc::new(GatewayState {
        config: config.clone(),
        auth_client,
        service_client: ServiceClient::new(config.gateway.forward_timeout_secs),
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .fallback(gateway::route_request)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gateway::identity_propagation,
        ))
        .layer(middleware::from_fn(request_logging))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Gateway listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
