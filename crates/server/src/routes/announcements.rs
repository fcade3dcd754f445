use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::announcement::{Announcement, CreateAnnouncement};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, extract::JsonBody};

pub async fn get_announcements(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Announcement>>>, ApiError> {
    let announcements = Announcement::find_all(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(announcements)))
}

/// Newest announcement, or `null` when there are none.
pub async fn get_latest_announcement(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Option<Announcement>>>, ApiError> {
    let latest = Announcement::find_latest(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(latest)))
}

pub async fn create_announcement(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateAnnouncement>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Announcement>>), ApiError> {
    if payload.announcement.trim().is_empty() {
        return Err(ApiError::BadRequest("Announcement text is required".to_string()));
    }

    let announcement = Announcement::create(state.pool(), &payload).await?;

    tracing::info!(
        announcement_id = %announcement.id,
        created_by = %announcement.created_by,
        "Announcement created"
    );

    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            announcement,
            "Announcement created successfully",
        )),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/announcements",
            get(get_announcements).post(create_announcement),
        )
        .route("/announcements/latest", get(get_latest_announcement))
}
