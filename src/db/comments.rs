use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::posts::{Counter, decrement_counter, increment_counter};
use crate::{
    error::{AppError, is_foreign_key_violation},
    models::comment::CommentResponse,
    utils::validation::{normalize_text, validate_comment},
};

// Names Postgres gives the inline REFERENCES clauses.
const POST_CONSTRAINT: &str = "comments_post_id_fkey";
const AUTHOR_CONSTRAINT: &str = "comments_author_id_fkey";

/// Inserts a comment and bumps `posts.comments` in the same transaction.
pub async fn add_comment(
    pool: &PgPool,
    post_id: Uuid,
    author_id: Uuid,
    content: &str,
) -> Result<Uuid, AppError> {
    validate_comment(content)?;
    let content = normalize_text(content);

    let mut tx = pool.begin().await?;
    let comment_id = Uuid::new_v4();

    let inserted = sqlx::query(
        r#"
        INSERT INTO comments (id, post_id, author_id, content)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(comment_id)
    .bind(post_id)
    .bind(author_id)
    .bind(&content)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e, Some(POST_CONSTRAINT)) {
            AppError::NotFound("Post not found".to_string())
        } else if is_foreign_key_violation(&e, Some(AUTHOR_CONSTRAINT)) {
            AppError::NotFound("User not found".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    if inserted.rows_affected() > 0 {
        increment_counter(&mut tx, post_id, Counter::Comments, 1).await?;
    }

    tx.commit().await?;

    Ok(comment_id)
}

/// Checks that the comment exists under `post_id` and belongs to `requester_id`.
async fn authorize_comment(
    conn: &mut PgConnection,
    post_id: Uuid,
    comment_id: Uuid,
    requester_id: Uuid,
    action: &str,
) -> Result<(), AppError> {
    let author_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT author_id FROM comments WHERE id = $1 AND post_id = $2",
    )
    .bind(comment_id)
    .bind(post_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    if author_id != requester_id {
        return Err(AppError::Forbidden(format!(
            "You are not authorized to {} this comment",
            action
        )));
    }
    Ok(())
}

/// Author-only content update.
pub async fn edit_comment(
    pool: &PgPool,
    post_id: Uuid,
    comment_id: Uuid,
    requester_id: Uuid,
    content: &str,
) -> Result<(), AppError> {
    validate_comment(content)?;
    let content = normalize_text(content);

    let mut tx = pool.begin().await?;
    authorize_comment(&mut tx, post_id, comment_id, requester_id, "edit").await?;

    sqlx::query("UPDATE comments SET content = $3, updated_at = NOW() WHERE id = $1 AND post_id = $2")
        .bind(comment_id)
        .bind(post_id)
        .bind(&content)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Author-only delete. The counter only moves when a row was actually removed,
/// so a racing second delete cannot decrement twice.
pub async fn delete_comment(
    pool: &PgPool,
    post_id: Uuid,
    comment_id: Uuid,
    requester_id: Uuid,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    authorize_comment(&mut tx, post_id, comment_id, requester_id, "delete").await?;

    let deleted = sqlx::query("DELETE FROM comments WHERE id = $1 AND post_id = $2")
        .bind(comment_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    decrement_counter(&mut tx, post_id, Counter::Comments, deleted as i32).await?;
    tx.commit().await?;

    Ok(())
}

/// Oldest first, with author nickname and image.
pub async fn list_comments(pool: &PgPool, post_id: Uuid) -> Result<Vec<CommentResponse>, AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM posts WHERE id = $1)")
        .bind(post_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let comments = sqlx::query_as::<_, CommentResponse>(
        r#"
        SELECT
            c.id, c.post_id, c.author_id, u.nickname, u.profile_image,
            c.content, c.created_at, c.updated_at
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.post_id = $1
        ORDER BY c.created_at ASC, c.id
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

/// Removes every comment on a post. Only used while the post itself is being deleted,
/// so no counter is adjusted.
pub(crate) async fn delete_comments_by_post(
    conn: &mut PgConnection,
    post_id: Uuid,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM comments WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Removes every comment written by a user, across all posts, and lowers each
/// affected post's counter by the number of that user's comments removed from it.
/// Runs inside the caller's transaction. Returns the number of comments removed.
pub(crate) async fn delete_comments_by_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<u64, AppError> {
    let per_post = sqlx::query_as::<_, (Uuid, i32)>(
        r#"
        WITH removed AS (
            DELETE FROM comments WHERE author_id = $1 RETURNING post_id
        ), per_post AS (
            SELECT post_id, COUNT(*)::INTEGER AS removed FROM removed GROUP BY post_id
        )
        UPDATE posts p
        SET comments = GREATEST(p.comments - per_post.removed, 0)
        FROM per_post
        WHERE p.id = per_post.post_id
        RETURNING p.id, per_post.removed
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(per_post.iter().map(|(_, n)| *n as u64).sum())
}
