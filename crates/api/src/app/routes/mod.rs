use axum::{Router, routing::get, routing::post};

pub mod auth;
pub mod system;
pub mod tasks;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/auth/logout", post(auth::logout))
        .nest("/users", users::router())
        .nest("/tasks", tasks::router())
}
