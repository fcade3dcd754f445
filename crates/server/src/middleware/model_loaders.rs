use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::models::{designation::Designation, task::Task};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub async fn load_task_middleware(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let task = match Task::find_by_id(state.pool(), task_id).await? {
        Some(task) => task,
        None => {
            tracing::warn!("Task {} not found", task_id);
            return Err(ApiError::NotFound("Task not found".to_string()));
        }
    };

    request.extensions_mut().insert(task);
    Ok(next.run(request).await)
}

pub async fn load_designation_middleware(
    State(state): State<AppState>,
    Path(designation_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let designation = match Designation::find_by_id(state.pool(), designation_id).await? {
        Some(designation) => designation,
        None => {
            tracing::warn!("Designation {} not found", designation_id);
            return Err(ApiError::NotFound("Designation not found".to_string()));
        }
    };

    request.extensions_mut().insert(designation);
    Ok(next.run(request).await)
}
