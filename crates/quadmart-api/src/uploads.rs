use axum::{
    Extension,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use tokio::io::AsyncWriteExt;
use tracing::error;
use uuid::Uuid;

use quadmart_types::api::{Claims, UploadResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// 10 MB cap for listing images and message attachments
const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// POST /uploads — accepts raw bytes, saves to the upload dir, inserts a
/// DB row, returns the reference to embed in an item or message.
pub async fn upload(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::Validation("upload is empty".into()));
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(ApiError::Validation("upload exceeds the 10 MB limit".into()));
    }

    let file_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let file_name = headers
        .get("x-file-name")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("upload")
        .to_string();

    let file_id = Uuid::new_v4().to_string();
    let size = bytes.len() as i64;

    tokio::fs::create_dir_all(&state.upload_dir).await.map_err(|e| {
        ApiError::Internal(format!("failed to create upload dir: {}", e))
    })?;

    let file_path = state.upload_dir.join(&file_id);
    let mut file = tokio::fs::File::create(&file_path).await.map_err(|e| {
        ApiError::Internal(format!("failed to create {}: {}", file_path.display(), e))
    })?;
    file.write_all(&bytes).await.map_err(|e| {
        ApiError::Internal(format!("failed to write {}: {}", file_path.display(), e))
    })?;

    let db = state.clone();
    let fid = file_id.clone();
    let uid = claims.sub.to_string();
    let fname = file_name.clone();
    let ftype = file_type.clone();
    blocking(move || db.db.insert_upload(&fid, &uid, &fname, &ftype, size)).await?;

    Ok((
        StatusCode::CREATED,
        axum::Json(UploadResponse {
            url: format!("/uploads/{}", file_id),
            file_type,
            file_name,
            size: size as u64,
        }),
    ))
}

/// GET /uploads/{file_id} — streams the stored bytes back with the original
/// content type.
pub async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // Valid UUID or nothing — keeps path traversal out of the upload dir.
    file_id
        .parse::<Uuid>()
        .map_err(|_| ApiError::Validation("invalid file id".into()))?;

    let db = state.clone();
    let fid = file_id.clone();
    let row = blocking(move || db.db.get_upload(&fid))
        .await?
        .ok_or(ApiError::NotFound("file"))?;

    let file_path = state.upload_dir.join(&file_id);
    let bytes = tokio::fs::read(&file_path).await.map_err(|e| {
        error!("upload {} exists in DB but not on disk: {}", file_id, e);
        ApiError::NotFound("file")
    })?;

    Ok(([(header::CONTENT_TYPE, row.file_type)], bytes))
}
