use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::uploads;
use crate::{
    error::{AppError, is_foreign_key_violation},
    models::post::PostResponse,
};

/// Cached aggregate columns on `posts` that track a detail table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Likes,
    Comments,
}

impl Counter {
    fn column(self) -> &'static str {
        match self {
            Counter::Likes => "likes",
            Counter::Comments => "comments",
        }
    }
}

/// Adds `by` to a post's counter. Returns the new value, or `None` if the post is gone.
pub(crate) async fn increment_counter(
    conn: &mut PgConnection,
    post_id: Uuid,
    counter: Counter,
    by: i32,
) -> Result<Option<i32>, AppError> {
    let sql = format!(
        "UPDATE posts SET {col} = {col} + $2 WHERE id = $1 RETURNING {col}",
        col = counter.column()
    );
    let value = sqlx::query_scalar::<_, i32>(&sql)
        .bind(post_id)
        .bind(by)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(value)
}

/// Subtracts `by` from a post's counter, never going below zero.
pub(crate) async fn decrement_counter(
    conn: &mut PgConnection,
    post_id: Uuid,
    counter: Counter,
    by: i32,
) -> Result<Option<i32>, AppError> {
    let sql = format!(
        "UPDATE posts SET {col} = GREATEST({col} - $2, 0) WHERE id = $1 RETURNING {col}",
        col = counter.column()
    );
    let value = sqlx::query_scalar::<_, i32>(&sql)
        .bind(post_id)
        .bind(by)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(value)
}

/// Inserts a post with zeroed counters. Input must already be validated.
/// `post_image` must be an unattached upload of the author.
pub async fn create_post(
    pool: &PgPool,
    author_id: Uuid,
    title: &str,
    content: &str,
    post_image: Option<&str>,
) -> Result<Uuid, AppError> {
    let mut tx = pool.begin().await?;
    let post_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO posts (id, author_id, title, content, post_image)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(title)
    .bind(content)
    .bind(post_image)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e, None) {
            AppError::NotFound("User not found".to_string())
        } else {
            tracing::error!("Failed to create post: {:?}", e);
            AppError::from(e)
        }
    })?;

    if let Some(image) = post_image {
        uploads::attach_upload(&mut tx, image, author_id).await?;
    }

    tx.commit().await?;

    Ok(post_id)
}

/// Newest first. `cursor` is the `created_at` of the last post on the previous page.
pub async fn list_posts(
    pool: &PgPool,
    cursor: Option<DateTime<Utc>>,
    limit: i64,
) -> Result<Vec<PostResponse>, AppError> {
    let posts = sqlx::query_as::<_, PostResponse>(
        r#"
        SELECT
            p.id, p.title, p.content, p.post_image,
            p.likes, p.views, p.comments,
            p.created_at, p.updated_at,
            p.author_id, u.nickname, u.profile_image
        FROM posts p
        JOIN users u ON u.id = p.author_id
        WHERE ($1::TIMESTAMPTZ IS NULL OR p.created_at < $1)
        ORDER BY p.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(cursor)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

/// A single post with author info; `is_liked` is relative to `viewer`.
pub async fn get_post(
    pool: &PgPool,
    post_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<Option<PostResponse>, AppError> {
    let post = sqlx::query_as::<_, PostResponse>(
        r#"
        SELECT
            p.id, p.title, p.content, p.post_image,
            p.likes, p.views, p.comments,
            p.created_at, p.updated_at,
            p.author_id, u.nickname, u.profile_image,
            EXISTS (
                SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $2
            ) AS is_liked
        FROM posts p
        JOIN users u ON u.id = p.author_id
        WHERE p.id = $1
        "#,
    )
    .bind(post_id)
    .bind(viewer)
    .fetch_optional(pool)
    .await?;

    Ok(post)
}

/// Best-effort analytics counter; not protected by the viewer's transaction.
/// Returns false when the post does not exist.
pub async fn increase_view_count(pool: &PgPool, post_id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE posts SET views = views + 1 WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// New field values for an author edit.
#[derive(Debug)]
pub struct PostEdit<'a> {
    pub title: &'a str,
    pub content: &'a str,
    /// Replacement image; ignored when `remove_image` is set.
    pub post_image: Option<&'a str>,
    pub remove_image: bool,
}

/// Author-only update. A new image must be an unattached upload of the author.
/// Returns the previous image when it was replaced or removed and the author owned
/// it, so the caller can delete the stored file once the update has committed.
pub async fn edit_post(
    pool: &PgPool,
    post_id: Uuid,
    requester_id: Uuid,
    edit: PostEdit<'_>,
) -> Result<Option<String>, AppError> {
    let mut tx = pool.begin().await?;

    let (author_id, previous_image) = sqlx::query_as::<_, (Uuid, Option<String>)>(
        "SELECT author_id, post_image FROM posts WHERE id = $1 FOR UPDATE",
    )
    .bind(post_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if author_id != requester_id {
        return Err(AppError::Forbidden(
            "You are not authorized to edit this post".to_string(),
        ));
    }

    let next_image = if edit.remove_image {
        None
    } else {
        edit.post_image
            .map(str::to_string)
            .or_else(|| previous_image.clone())
    };

    sqlx::query(
        r#"
        UPDATE posts
        SET title = $2, content = $3, post_image = $4, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .bind(edit.title)
    .bind(edit.content)
    .bind(&next_image)
    .execute(&mut *tx)
    .await?;

    if next_image != previous_image {
        if let Some(image) = &next_image {
            uploads::attach_upload(&mut tx, image, requester_id).await?;
        }
    }

    let replaced: Vec<String> = previous_image
        .filter(|prev| Some(prev) != next_image.as_ref())
        .into_iter()
        .collect();
    let released = uploads::release_uploads(&mut tx, requester_id, &replaced).await?;

    tx.commit().await?;

    Ok(released.into_iter().next())
}
