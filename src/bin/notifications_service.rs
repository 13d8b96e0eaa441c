// ============================================================================
// Notifications Service
// ============================================================================
//
// Consumes the email queue and serves a guarded direct-send endpoint.
// Delivery itself is the Mailer collaborator's concern.
//
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staybook_server::auth_client::AuthClient;
use staybook_server::config::Config;
use staybook_server::context::{AppContext, NotificationsContext};
use staybook_server::notifications::{self, TracingMailer};
use staybook_server::routes;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Notifications Service Starting ===");
    info!("Port: {}", config.port);
    info!("Auth transport: {}", config.auth_transport.as_str());

    let mailer = Arc::new(TracingMailer);

    // Queue consumer
    tokio::spawn({
        let config = config.clone();
        let mailer = mailer.clone();
        async move {
            if let Err(e) = notifications::run_email_worker(&config, mailer).await {
                warn!(error = %e, "Email queue unavailable; worker stopped");
            }
        }
    });

    let auth_client = Arc::new(AuthClient::from_config(&config).await?);
    let ctx = Arc::new(NotificationsContext {
        app: Arc::new(AppContext::new(config.clone(), auth_client)),
        mailer,
    });

    let app = routes::notifications_router(ctx)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Notifications service listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
