// ============================================================================
// GraphQL Guard Tests
// ============================================================================
//
// The guard's second entry point. Direct schema execution covers the
// context-shape and role rules; the HTTP round trip covers the full
// pipeline through the axum handler.
//
// ============================================================================

use std::sync::Arc;

use axum::http::HeaderMap;
use serde_json::json;
use uuid::Uuid;

use staybook_server::auth_client::{AuthClient, TcpAuthClient};
use staybook_server::config::Config;
use staybook_server::context::{AppContext, ReservationsContext};
use staybook_server::graphql::{build_schema, RequestEnvelope, ReservationsSchema};
use staybook_server::identity::Identity;
use staybook_server::payments::DemoPaymentProcessor;
use staybook_server::stores::{InMemoryReservationStore, ReservationStore};

mod test_utils;
use test_utils::{register_and_login, spawn_authority, spawn_reservations, unique_email, TEST_SECRET};

fn identity_with_roles(roles: &[&str]) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: "guest@example.com".to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

/// Schema over in-memory stores; the auth client is never dialed because
/// these tests inject identities directly.
fn offline_schema() -> (ReservationsSchema, Arc<ReservationsContext>) {
    let config = Arc::new(Config::for_tests(TEST_SECRET));
    let auth_client = Arc::new(AuthClient::Tcp(TcpAuthClient::new(
        "127.0.0.1:1".to_string(),
        std::time::Duration::from_millis(100),
    )));
    let ctx = Arc::new(ReservationsContext {
        app: Arc::new(AppContext::new(config, auth_client)),
        reservations: Arc::new(InMemoryReservationStore::new()),
        payments: Arc::new(DemoPaymentProcessor),
        notifications: None,
    });
    (build_schema(ctx.clone()), ctx)
}

fn envelope() -> RequestEnvelope {
    RequestEnvelope {
        headers: HeaderMap::new(),
    }
}

#[tokio::test]
async fn missing_envelope_is_a_denial_not_a_crash() {
    let (schema, _ctx) = offline_schema();

    // Executed outside the HTTP handler: no wrapped request in context
    let response = schema.execute("{ myReservations { id } }").await;

    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Unauthorized");
}

#[tokio::test]
async fn anonymous_request_is_denied_on_protected_fields() {
    let (schema, _ctx) = offline_schema();

    let request = async_graphql::Request::new("{ myReservations { id } }").data(envelope());
    let response = schema.execute(request).await;

    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Unauthorized");
}

#[tokio::test]
async fn authenticated_request_resolves_with_its_identity() {
    let (schema, _ctx) = offline_schema();

    let request = async_graphql::Request::new("{ myReservations { id } }")
        .data(envelope())
        .data(identity_with_roles(&[]));
    let response = schema.execute(request).await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({"myReservations": []})
    );
}

#[tokio::test]
async fn role_guard_applies_or_semantics() {
    let (schema, _ctx) = offline_schema();

    // No staff role: denied
    let request = async_graphql::Request::new("{ allReservations { id } }")
        .data(envelope())
        .data(identity_with_roles(&[]));
    let response = schema.execute(request).await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Unauthorized");

    // "staff" alone satisfies the {admin, staff} requirement
    let request = async_graphql::Request::new("{ allReservations { id } }")
        .data(envelope())
        .data(identity_with_roles(&["staff"]));
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
}

#[tokio::test]
async fn mutation_attributes_the_reservation_to_the_context_identity() {
    let (schema, ctx) = offline_schema();
    let identity = identity_with_roles(&[]);

    let query = r#"
        mutation($input: CreateReservationInput!) {
            createReservation(input: $input) { id userId placeId }
        }
    "#;
    let variables = async_graphql::Variables::from_json(json!({
        "input": {
            "placeId": "cabin-12",
            "startDate": "2026-09-01",
            "endDate": "2026-09-04",
            "amountCents": 42000
        }
    }));

    let request = async_graphql::Request::new(query)
        .variables(variables)
        .data(envelope())
        .data(identity.clone());
    let response = schema.execute(request).await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(
        data["createReservation"]["userId"].as_str().unwrap(),
        identity.id.to_string()
    );

    let stored = ctx.reservations.list_for_user(&identity.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].place_id, "cabin-12");
}

#[tokio::test]
async fn http_round_trip_shares_the_rest_guard_pipeline() {
    let authority = spawn_authority().await;
    let reservations = spawn_reservations(&authority.tcp_addr).await;
    let client = reqwest::Client::new();

    let (token, user_id) = register_and_login(
        &client,
        &authority.http_url,
        &unique_email("gql"),
        "StrongPassword123!@",
    )
    .await;

    let body = json!({
        "query": "mutation($input: CreateReservationInput!) { createReservation(input: $input) { id userId } }",
        "variables": {
            "input": {
                "placeId": "villa-7",
                "startDate": "2026-10-01",
                "endDate": "2026-10-05",
                "amountCents": 98000
            }
        }
    });

    // With the credential in the authentication header
    let response = client
        .post(format!("{}/graphql", reservations.url))
        .header("authentication", &token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let payload: serde_json::Value = response.json().await.unwrap();
    assert!(payload["errors"].is_null(), "{}", payload);
    assert_eq!(
        payload["data"]["createReservation"]["userId"]
            .as_str()
            .unwrap(),
        user_id.to_string()
    );

    // Without a credential the same operation is denied and nothing new
    // is stored
    let before = reservations.ctx.reservations.list_all().await.unwrap().len();
    let response = client
        .post(format!("{}/graphql", reservations.url))
        .json(&body)
        .send()
        .await
        .unwrap();
    let payload: serde_json::Value = response.json().await.unwrap();
    assert_eq!(payload["errors"][0]["message"].as_str().unwrap(), "Unauthorized");
    let after = reservations.ctx.reservations.list_all().await.unwrap().len();
    assert_eq!(before, after);
}
