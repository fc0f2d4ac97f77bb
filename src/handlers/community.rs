use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{CurrentUser, MaybeUser, cookies},
    config::{Config, VIEW_WINDOW_SECONDS},
    db::{cascade, posts},
    error::AppError,
    models::post::{CreatePostRequest, EditPostRequest, PostListParams},
    storage::{FileStore, delete_files_best_effort},
    utils::{
        jwt::{read_viewed_posts, sign_viewed_posts},
        validation::normalize_text,
    },
};

/// Create a new post.
pub async fn create_post(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let post_id = posts::create_post(
        &pool,
        user.id,
        &normalize_text(&payload.title),
        &normalize_text(&payload.content),
        payload.post_image.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "postId": post_id })),
    ))
}

/// List posts (Recent first).
/// Supports cursor-based pagination.
pub async fn list_posts(
    State(pool): State<PgPool>,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let posts = posts::list_posts(&pool, params.cursor, limit)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list posts: {:?}", e);
            e
        })?;

    Ok(Json(posts))
}

/// Get a single post by ID.
///
/// The first view by a client within the view window increments `views`; the
/// client keeps the list of viewed posts in a signed cookie.
pub async fn get_post(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let mut viewed = read_viewed_posts(
        cookies::get_cookie_value(&headers, cookies::VIEWED_POSTS_COOKIE),
        &config.token_secret,
    );

    let mut viewed_cookie = None;
    if !viewed.contains(id) {
        if !posts::increase_view_count(&pool, id).await? {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        viewed.record(id)?;
        let token = sign_viewed_posts(&viewed, &config.token_secret)?;
        viewed_cookie = Some(cookies::viewed_posts_cookie(&token, VIEW_WINDOW_SECONDS));
    }

    let post = posts::get_post(&pool, id, viewer.map(|u| u.id))
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    let mut response = Json(post).into_response();
    if let Some(cookie) = viewed_cookie {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        response.headers_mut().insert(header::SET_COOKIE, value);
    }

    Ok(response)
}

/// Edit a post.
/// Requires: Login + Author.
pub async fn edit_post(
    State(pool): State<PgPool>,
    State(files): State<Arc<dyn FileStore>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditPostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let title = normalize_text(&payload.title);
    let content = normalize_text(&payload.content);

    let replaced_image = posts::edit_post(
        &pool,
        id,
        user.id,
        posts::PostEdit {
            title: &title,
            content: &content,
            post_image: payload.post_image.as_deref(),
            remove_image: payload.is_image_deleted,
        },
    )
    .await?;

    delete_files_best_effort(files.as_ref(), replaced_image).await;

    Ok(Json(serde_json::json!({ "postId": id })))
}

/// Delete a post together with its comments, likes and image.
/// Requires: Login + Author.
pub async fn delete_post(
    State(pool): State<PgPool>,
    State(files): State<Arc<dyn FileStore>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    cascade::delete_post(&pool, files.as_ref(), id, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
