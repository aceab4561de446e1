use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::RequesterContext;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    if let Err(e) = body.validate() {
        return errors::validation_response(&e);
    }

    match services.login(&body.email, &body.password).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "access_token": outcome.token,
                "user": dto::user_summary_json(&outcome.user),
            })),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

/// Stateless acknowledgement: token invalidation is the client's job.
pub async fn logout(Extension(_requester): Extension<RequesterContext>) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}
