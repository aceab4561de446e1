use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use taskdesk_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequesterContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
}

/// Everything except `GET /users/:id` is admin-only.
fn require_admin(requester: &RequesterContext) -> Result<(), axum::response::Response> {
    if requester.is_admin() {
        Ok(())
    } else {
        Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "Admin access required",
        ))
    }
}

fn parse_user_id(id: &str) -> Result<UserId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id")
    })
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(requester): Extension<RequesterContext>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = require_admin(&requester) {
        return resp;
    }
    let input = match body.validate() {
        Ok(input) => input,
        Err(e) => return errors::validation_response(&e),
    };

    match services.create_user(input).await {
        Ok(user) => (StatusCode::CREATED, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(requester): Extension<RequesterContext>,
) -> axum::response::Response {
    if let Err(resp) = require_admin(&requester) {
        return resp;
    }

    match services.list_users().await {
        Ok(users) => {
            let items = users.iter().map(dto::user_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::Value::Array(items))).into_response()
        }
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.get_user(id).await {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(requester): Extension<RequesterContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = require_admin(&requester) {
        return resp;
    }
    let id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let (update, new_password) = match body.validate() {
        Ok(parts) => parts,
        Err(e) => return errors::validation_response(&e),
    };

    match services.update_user(id, update, new_password).await {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(requester): Extension<RequesterContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = require_admin(&requester) {
        return resp;
    }
    let id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.delete_user(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "User deleted successfully" })),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
