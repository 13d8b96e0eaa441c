// ============================================================================
// Payments Service
// ============================================================================
//
// Role-gated charge creation behind the payment-processor collaborator.
//
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staybook_server::auth_client::AuthClient;
use staybook_server::config::Config;
use staybook_server::context::{AppContext, PaymentsContext};
use staybook_server::payments::DemoPaymentProcessor;
use staybook_server::routes;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Payments Service Starting ===");
    info!("Port: {}", config.port);
    info!("Auth transport: {}", config.auth_transport.as_str());

    let auth_client = Arc::new(AuthClient::from_config(&config).await?);
    let ctx = Arc::new(PaymentsContext {
        app: Arc::new(AppContext::new(config.clone(), auth_client)),
        payments: Arc::new(DemoPaymentProcessor),
    });

    let app =
        routes::payments_router(ctx).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Payments service listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
