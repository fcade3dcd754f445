use axum::{
    Extension, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::{delete, get},
};
use db::models::file_record::{FileRecord, FileScope};
use services::services::file_storage::UploadedFile;
use utils::response::ApiResponse;

use crate::{AppState, auth::AuthContext, error::ApiError};

const UPLOAD_FIELD: &str = "file";

pub async fn list_files(
    State(state): State<AppState>,
    Path((category, zone, branch)): Path<(String, String, String)>,
) -> Result<ResponseJson<ApiResponse<Vec<FileRecord>>>, ApiError> {
    let scope = FileScope::new(category, zone, branch);
    let files = state.storage().list(&scope).await?;
    Ok(ResponseJson(ApiResponse::success(files)))
}

pub async fn upload_file(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((category, zone, branch)): Path<(String, String, String)>,
    mut multipart: Multipart,
) -> Result<(StatusCode, ResponseJson<ApiResponse<FileRecord>>), ApiError> {
    let mut uploaded = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("Uploaded file has no name".to_string()))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await?;

        uploaded = Some(UploadedFile {
            filename,
            content_type,
            data,
        });
        break;
    }

    let file = uploaded.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    tracing::debug!(
        user_id = %auth.user_id,
        filename = %file.filename,
        content_type = %file.content_type,
        size = file.data.len(),
        "Received upload"
    );

    let scope = FileScope::new(category, zone, branch);
    let record = state.storage().upload(&scope, file).await?;

    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            record,
            "File uploaded successfully",
        )),
    ))
}

pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.storage().open_download(&filename).await?;

    let content_type = HeaderValue::from_str(&download.record.filetype)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let headers = [
        (header::CONTENT_TYPE, content_type),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&download.record.filename),
        ),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        (header::CONTENT_LENGTH, HeaderValue::from(download.blob.length)),
    ];

    Ok((headers, Body::from_stream(download.stream)).into_response())
}

pub async fn delete_file(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((category, zone, branch, filename)): Path<(String, String, String, String)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let scope = FileScope::new(category, zone, branch);
    state.storage().delete(&scope, &filename).await?;
    tracing::info!(user_id = %auth.user_id, filename = %filename, "File deleted by user");
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "File deleted successfully",
    )))
}

/// `attachment; filename="..."`, with an RFC 5987 `filename*` for non-ASCII names.
fn content_disposition(filename: &str) -> HeaderValue {
    if filename.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", escaped)) {
            return value;
        }
    }

    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let upload_limit = state.config().upload_body_limit();

    Router::new()
        .route("/files/download/{filename}", get(download_file))
        .route(
            "/files/{category}/{zone}/{branch}",
            get(list_files)
                .post(upload_file)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/files/{category}/{zone}/{branch}/{filename}",
            delete(delete_file),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("trade_license.pdf"),
            "attachment; filename=\"trade_license.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        assert_eq!(
            content_disposition("a\"b.pdf"),
            "attachment; filename=\"a\\\"b.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition("café menu.pdf");
        assert_eq!(
            value,
            "attachment; filename=\"caf__menu.pdf\"; filename*=UTF-8''caf%C3%A9%20menu.pdf"
        );
    }
}
