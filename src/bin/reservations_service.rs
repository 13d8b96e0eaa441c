// ============================================================================
// Reservations Service
// ============================================================================
//
// Protected booking CRUD over REST and GraphQL, both behind the shared
// request guard. Charges go through the payment collaborator; booking
// confirmations are queued for notifications-service.
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
use staybook_server::config::{Config, StoreBackend};
use staybook_server::context::{AppContext, ReservationsContext};
use staybook_server::db;
use staybook_server::notifications::NotificationQueue;
use staybook_server::payments::DemoPaymentProcessor;
use staybook_server::routes;
use staybook_server::stores::{InMemoryReservationStore, PgReservationStore, ReservationStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Reservations Service Starting ===");
    info!("Port: {}", config.port);
    info!("Auth transport: {}", config.auth_transport.as_str());
    if config.gateway_trust {
        info!("Gateway trust enabled: accepting pre-verified identities");
    }

    let auth_client = Arc::new(AuthClient::from_config(&config).await?);
    let app = Arc::new(AppContext::new(config.clone(), auth_client));

    let reservations: Arc<dyn ReservationStore> = match config.store_backend {
        StoreBackend::Postgres => {
            info!("Connecting to database...");
            let pool = db::connect(&config.database_url).await?;
            info!("Connected to database");
            Arc::new(PgReservationStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory reservation store; data is lost on restart");
            Arc::new(InMemoryReservationStore::new())
        }
    };

    let notifications = match NotificationQueue::connect(&config).await {
        Ok(queue) => Some(queue),
        Err(e) => {
            warn!(error = %e, "Email queue unavailable; confirmation emails disabled");
            None
        }
    };

    let ctx = Arc::new(ReservationsContext {
        app,
        reservations,
        payments: Arc::new(DemoPaymentProcessor),
        notifications,
    });

    let app = routes::reservations_router(ctx)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Reservations service listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
