use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::designation::{CreateDesignation, Designation};
use utils::response::ApiResponse;

use crate::{
    AppState, error::ApiError, extract::JsonBody, middleware::load_designation_middleware,
};

pub async fn get_designations(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Designation>>>, ApiError> {
    let designations = Designation::find_all(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(designations)))
}

pub async fn create_designation(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateDesignation>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Designation>>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Designation name is required".to_string()));
    }

    let designation = match Designation::create(state.pool(), &payload).await {
        Ok(designation) => designation,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ApiError::Conflict(format!(
                "Designation '{}' already exists",
                payload.name.trim()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            designation,
            "Designation created successfully",
        )),
    ))
}

pub async fn delete_designation(
    Extension(designation): Extension<Designation>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Designation::delete(state.pool(), designation.id).await?;

    tracing::info!(
        designation_id = %designation.id,
        name = %designation.name,
        "Designation deleted"
    );

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Designation deleted successfully",
    )))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let designation_id_router = Router::new()
        .route("/", delete(delete_designation))
        .layer(from_fn_with_state(
            state.clone(),
            load_designation_middleware,
        ));

    let inner = Router::new()
        .route("/", get(get_designations).post(create_designation))
        .nest("/{designation_id}", designation_id_router);

    Router::new().nest("/designations", inner)
}
