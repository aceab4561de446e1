use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use taskdesk_core::TaskId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequesterContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", get(get_task).patch(update_task).delete(delete_task))
}

fn parse_task_id(id: &str) -> Result<TaskId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid task id")
    })
}

pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(requester): Extension<RequesterContext>,
    Json(body): Json<dto::CreateTaskRequest>,
) -> axum::response::Response {
    let new = match body.validate() {
        Ok(new) => new,
        Err(e) => return errors::validation_response(&e),
    };

    let task = match services.create_task(requester.requester(), new).await {
        Ok(task) => task,
        Err(e) => return errors::error_to_response(e),
    };

    match services.task_view(&task).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn list_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(requester): Extension<RequesterContext>,
    Query(params): Query<dto::ListTasksParams>,
) -> axum::response::Response {
    let query = match params.validate() {
        Ok(query) => query,
        Err(e) => return errors::validation_response(&e),
    };

    let page = match services.list_tasks(requester.requester(), query).await {
        Ok(page) => page,
        Err(e) => return errors::error_to_response(e),
    };

    // Resolve user summaries row by row; pages are small.
    let mut data = Vec::with_capacity(page.data.len());
    for task in &page.data {
        match services.task_view(task).await {
            Ok(view) => data.push(view),
            Err(e) => return errors::error_to_response(e),
        }
    }

    let envelope = taskdesk_tasks::TaskPage {
        data,
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages,
        has_next_page: page.has_next_page,
        has_prev_page: page.has_prev_page,
    };
    (StatusCode::OK, Json(envelope)).into_response()
}

pub async fn get_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(requester): Extension<RequesterContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let task = match services.get_task(requester.requester(), id).await {
        Ok(task) => task,
        Err(e) => return errors::error_to_response(e),
    };

    match services.task_view(&task).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn update_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(requester): Extension<RequesterContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateTaskRequest>,
) -> axum::response::Response {
    let id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let update = match body.validate() {
        Ok(update) => update,
        Err(e) => return errors::validation_response(&e),
    };

    let task = match services.update_task(requester.requester(), id, update).await {
        Ok(task) => task,
        Err(e) => return errors::error_to_response(e),
    };

    match services.task_view(&task).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(requester): Extension<RequesterContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.delete_task(requester.requester(), id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Task deleted successfully" })),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
