// Generated gRPC code for the authority's AuthService.
// This creates the `proto::auth::v1` module structure.
pub mod proto {
    pub mod auth {
        pub mod v1 {
            tonic::include_proto!("staybook.auth.v1");
        }
    }
}

pub mod auth;
pub mod auth_client;
pub mod authority;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod extractors;
pub mod gateway;
pub mod graphql;
pub mod guard;
pub mod handlers;
pub mod identity;
pub mod notifications;
pub mod payments;
pub mod routes;
pub mod stores;
pub mod wire;
