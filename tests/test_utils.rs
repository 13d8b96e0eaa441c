//! Shared helpers: in-process authority and services on ephemeral ports,
//! backed by in-memory stores, talking over the real transports.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

use staybook_server::auth::AuthManager;
use staybook_server::auth_client::AuthClient;
use staybook_server::authority::{self, AuthorityCore};
use staybook_server::config::Config;
use staybook_server::context::{AppContext, AuthorityContext, ReservationsContext};
use staybook_server::payments::DemoPaymentProcessor;
use staybook_server::routes;
use staybook_server::stores::{InMemoryReservationStore, InMemoryUserStore, UserStore};

pub const TEST_SECRET: &str = "a1b2c3d4e5f6g7h8i9j0k1l2m3n4o5p6";

pub struct TestAuthority {
    pub core: Arc<AuthorityCore>,
    pub store: Arc<InMemoryUserStore>,
    /// Framed-TCP transport endpoint
    pub tcp_addr: String,
    /// HTTP endpoint (register/login)
    pub http_url: String,
}

/// Starts the authority with its TCP and HTTP frontends on ephemeral
/// ports, backed by an in-memory user store.
pub async fn spawn_authority() -> TestAuthority {
    let config = Arc::new(Config::for_tests(TEST_SECRET));
    let store = Arc::new(InMemoryUserStore::new());
    let core = Arc::new(AuthorityCore::new(
        store.clone(),
        AuthManager::new(&config).unwrap(),
    ));

    let tcp_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let tcp_addr = tcp_listener.local_addr().unwrap().to_string();
    tokio::spawn({
        let core = core.clone();
        async move {
            let _ = authority::tcp::serve(core, tcp_listener).await;
        }
    });

    let ctx = Arc::new(AuthorityContext {
        config: config.clone(),
        core: core.clone(),
    });
    let app = routes::auth_router(ctx);
    let http_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let http_url = format!("http://{}", http_listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(http_listener, app).await.unwrap();
    });

    TestAuthority {
        core,
        store,
        tcp_addr,
        http_url,
    }
}

pub struct TestReservations {
    pub url: String,
    pub ctx: Arc<ReservationsContext>,
}

/// Starts the reservations service (REST + GraphQL) with the TCP auth
/// backend pointed at the given authority address.
pub async fn spawn_reservations(auth_tcp_addr: &str) -> TestReservations {
    let mut config = Config::for_tests(TEST_SECRET);
    config.auth_tcp_addr = auth_tcp_addr.to_string();
    let config = Arc::new(config);

    let auth_client = Arc::new(AuthClient::from_config(&config).await.unwrap());
    let ctx = Arc::new(ReservationsContext {
        app: Arc::new(AppContext::new(config, auth_client)),
        reservations: Arc::new(InMemoryReservationStore::new()),
        payments: Arc::new(DemoPaymentProcessor),
        notifications: None,
    });

    let app = routes::reservations_router(ctx.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestReservations { url, ctx }
}

/// Registers through the HTTP surface and logs in; returns the minted
/// credential and the user id.
pub async fn register_and_login(
    client: &reqwest::Client,
    auth_url: &str,
    email: &str,
    password: &str,
) -> (String, Uuid) {
    let response = client
        .post(format!("{}/auth/register", auth_url))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201, "registration failed");
    let registered: serde_json::Value = response.json().await.unwrap();
    let user_id: Uuid = registered["id"].as_str().unwrap().parse().unwrap();

    let token = login(client, auth_url, email, password).await;
    (token, user_id)
}

pub async fn login(
    client: &reqwest::Client,
    auth_url: &str,
    email: &str,
    password: &str,
) -> String {
    let response = client
        .post(format!("{}/auth/login", auth_url))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200, "login failed");
    let body: serde_json::Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

/// Creates a user with elevated roles directly in the store (the public
/// registration surface never grants roles), then logs in over HTTP.
pub async fn seed_user_with_roles(
    authority: &TestAuthority,
    client: &reqwest::Client,
    email: &str,
    password: &str,
    roles: &[&str],
) -> (String, Uuid) {
    let password_hash = bcrypt::hash(password, 4).unwrap();
    let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
    let user = authority
        .store
        .create(email, &password_hash, &roles)
        .await
        .unwrap();

    let token = login(client, &authority.http_url, email, password).await;
    (token, user.id)
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}_{}@test.com", prefix, Uuid::new_v4().simple())
}
