use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::CurrentUser,
    db::{comments, likes},
    error::AppError,
    models::comment::CommentRequest,
};

/// Like a post. A second like by the same user is 409.
pub async fn like_post(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let likes = likes::like_post(&pool, post_id, user.id).await?;

    Ok(Json(serde_json::json!({ "likes": likes })))
}

/// Remove the caller's like. No-op if the post was not liked.
pub async fn unlike_post(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let likes = likes::unlike_post(&pool, post_id, user.id).await?;

    Ok(Json(serde_json::json!({ "likes": likes })))
}

/// Create a new comment.
pub async fn create_comment(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let comment_id = comments::add_comment(&pool, post_id, user.id, &payload.content).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "commentId": comment_id })),
    ))
}

/// List all comments for a post.
pub async fn list_comments(
    State(pool): State<PgPool>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let comments = comments::list_comments(&pool, post_id).await?;

    Ok(Json(comments))
}

pub async fn edit_comment(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    comments::edit_comment(&pool, post_id, comment_id, user.id, &payload.content).await?;

    Ok(Json(serde_json::json!({ "commentId": comment_id })))
}

pub async fn delete_comment(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    comments::delete_comment(&pool, post_id, comment_id, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
