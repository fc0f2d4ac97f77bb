use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    auth::MaybeUser,
    db::uploads,
    error::AppError,
    storage::{FileStore, delete_files_best_effort, extension_for_content_type},
};

/// Stores a PNG or JPEG sent as the raw request body.
/// Returns the filename to reference from post or profile requests.
///
/// Signed-in callers own the upload immediately. Anonymous uploads (a profile
/// image chosen during signup) stay unowned until an account attaches them.
pub async fn upload_image(
    State(pool): State<PgPool>,
    State(files): State<Arc<dyn FileStore>>,
    MaybeUser(user): MaybeUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let extension = extension_for_content_type(content_type).ok_or_else(|| {
        AppError::BadRequest("Only .jpeg, .jpg and .png images are allowed".to_string())
    })?;

    if body.is_empty() {
        return Err(AppError::BadRequest("Image is empty".to_string()));
    }

    let filename = files.store(&body, extension).await?;

    if let Err(e) = uploads::record_upload(&pool, &filename, user.map(|u| u.id)).await {
        delete_files_best_effort(files.as_ref(), [&filename]).await;
        return Err(e);
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "filename": filename })),
    ))
}
