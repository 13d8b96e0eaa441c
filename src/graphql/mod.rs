// ============================================================================
// GraphQL Subgraph (reservations)
// ============================================================================
//
// The second entry point of the request guard. The axum handler snapshots
// the HTTP request into the execution context (RequestEnvelope) and, when
// a credential verifies, attaches the identity as context data. Field
// guards then enforce authentication and roles with the same evaluator
// the HTTP middleware uses; resolvers read the identity back through
// `current_identity`.
//
// Verification failures at the handler are logged and swallowed: public
// fields still resolve, protected fields deny at their guard.
//
// ============================================================================

pub mod guard;
pub mod schema;

pub use schema::{build_schema, ReservationsSchema};

use std::sync::Arc;

use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{extract::State, http::HeaderMap, routing::post, Router};

use crate::context::{AppContext, ReservationsContext};
use crate::guard as request_guard;

/// The wrapped HTTP request, reachable from resolver context. Field
/// guards treat its absence as a malformed execution context.
pub struct RequestEnvelope {
    pub headers: HeaderMap,
}

#[derive(Clone)]
pub struct GraphQLState {
    pub schema: ReservationsSchema,
    pub app: Arc<AppContext>,
}

pub fn router(ctx: Arc<ReservationsContext>) -> Router {
    let state = GraphQLState {
        schema: build_schema(ctx.clone()),
        app: ctx.app.clone(),
    };

    Router::new()
        .route("/graphql", post(graphql_handler))
        .with_state(state)
}

pub async fn graphql_handler(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = request.into_inner();
    request = request.data(RequestEnvelope {
        headers: headers.clone(),
    });

    // Verify at most once per incoming request; the result is shared by
    // every field the query touches.
    let identity = if state.app.config.gateway_trust {
        request_guard::authorize_trusted(&headers, &[]).ok()
    } else {
        request_guard::resolve_identity(&headers, &state.app.auth_client).await
    };

    if let Some(identity) = identity {
        request = request.data(identity);
    }

    state.schema.execute(request).await.into()
}
