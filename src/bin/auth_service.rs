// ============================================================================
// Auth Service
// ============================================================================
//
// The Authentication Authority. Serves:
// - HTTP: register, login, authenticate
// - Framed TCP, Redis queue and gRPC frontends of the same core
//
// All frontends answer from one AuthorityCore, so the client transport
// never changes the outcome.
//
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staybook_server::auth::AuthManager;
use staybook_server::authority::{self, AuthorityCore};
use staybook_server::config::{Config, StoreBackend};
use staybook_server::context::AuthorityContext;
use staybook_server::db;
use staybook_server::routes;
use staybook_server::stores::{InMemoryUserStore, PgUserStore, UserStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Auth Service Starting ===");
    info!("Port: {}", config.port);

    let store: Arc<dyn UserStore> = match config.store_backend {
        StoreBackend::Postgres => {
            info!("Connecting to database...");
            let pool = db::connect(&config.database_url).await?;
            info!("Connected to database");
            Arc::new(PgUserStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory user store; data is lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let auth_manager = AuthManager::new(&config).context("Failed to initialize auth manager")?;
    let core = Arc::new(AuthorityCore::new(store, auth_manager));

    // Framed TCP frontend
    let tcp_listener = TcpListener::bind(&config.auth_tcp_addr)
        .await
        .with_context(|| format!("Failed to bind authority TCP address {}", config.auth_tcp_addr))?;
    tokio::spawn({
        let core = core.clone();
        async move {
            if let Err(e) = authority::tcp::serve(core, tcp_listener).await {
                tracing::error!(error = %e, "Authority TCP transport failed");
            }
        }
    });

    // gRPC frontend
    let grpc_addr: SocketAddr = config
        .auth_grpc_bind
        .parse()
        .with_context(|| format!("Invalid gRPC bind address {}", config.auth_grpc_bind))?;
    tokio::spawn({
        let core = core.clone();
        async move {
            info!(addr = %grpc_addr, "Authority gRPC transport listening");
            if let Err(e) = tonic::transport::Server::builder()
                .add_service(authority::grpc::service(core))
                .serve(grpc_addr)
                .await
            {
                tracing::error!(error = %e, "Authority gRPC transport failed");
            }
        }
    });

    // Queue frontend; requests queued while this worker is down are
    // consumed once it connects
    tokio::spawn({
        let core = core.clone();
        let config = config.clone();
        async move {
            if let Err(e) = authority::queue::run_worker(core, &config).await {
                warn!(error = %e, "Authority queue transport unavailable");
            }
        }
    });

    // HTTP frontend
    let ctx = Arc::new(AuthorityContext {
        config: config.clone(),
        core,
    });
    let app = routes::auth_router(ctx)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Auth service listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
