//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/hasher/token wiring behind [`services::AppServices`]
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs, validation, and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get, routing::post};
use tower::ServiceBuilder;

use taskdesk_auth::TokenVerifier;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(jwt_secret: String) -> Router {
    let services = Arc::new(services::build_services(jwt_secret).await);
    build_app_with_services(services)
}

/// Same router, but with pre-built services (used by tests to seed stores).
pub fn build_app_with_services(services: Arc<services::AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        tokens: services.tokens.clone() as Arc<dyn TokenVerifier>,
    };

    // Protected routes: require a verified bearer token.
    let protected = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    // Public routes: health probe + login.
    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .layer(Extension(services))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
