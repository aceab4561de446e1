use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::RequesterContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(requester): Extension<RequesterContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "id": requester.user_id().to_string(),
        "role": requester.requester().role.as_str(),
    }))
}
