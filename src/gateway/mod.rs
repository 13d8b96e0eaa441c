// ============================================================================
// API Gateway
// ============================================================================
//
// Single public entry point. Verifies the credential once per inbound
// request, then forwards it to the owning service with the resolved
// identity serialized into an internal header. Downstream services
// running with GATEWAY_TRUST=true accept that header instead of
// re-verifying.
//
// Trust boundary: the forwarded header is only as good as the network
// around it. Services must be reachable exclusively from the gateway;
// that is a deployment invariant this process cannot enforce.
//
// ============================================================================

pub mod middleware;
pub mod router;
pub mod service_client;

pub use middleware::{identity_propagation, GatewayState};
pub use router::route_request;
pub use service_client::ServiceClient;
