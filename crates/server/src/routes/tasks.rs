use axum::{
    Extension, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::task::{CreateTask, Task, TaskFilter, UpdateTask};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, extract::JsonBody, middleware::load_task_middleware};

pub async fn get_tasks(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_filtered(state.pool(), &filter).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(Extension(task): Extension<Task>) -> ResponseJson<ApiResponse<Task>> {
    ResponseJson(ApiResponse::success(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateTask>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Task>>), ApiError> {
    let fields = payload
        .into_fields()
        .ok_or_else(|| ApiError::BadRequest("All fields are required".to_string()))?;

    let task = Task::create(state.pool(), &fields).await?;

    tracing::info!(
        task_id = %task.id,
        zone = %task.zone,
        branch = %task.branch,
        "Task created"
    );

    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            task,
            "Task added successfully",
        )),
    ))
}

pub async fn update_task(
    Extension(existing): Extension<Task>,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::update(state.pool(), existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        task,
        "Task updated successfully",
    )))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Task::delete(state.pool(), task.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %task.id, "Task deleted");

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Task deleted successfully",
    )))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
