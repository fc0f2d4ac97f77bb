use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::posts::{Counter, decrement_counter, increment_counter};
use crate::error::{AppError, is_foreign_key_violation};

// Names Postgres gives the inline REFERENCES clauses.
const POST_CONSTRAINT: &str = "likes_post_id_fkey";
const USER_CONSTRAINT: &str = "likes_user_id_fkey";

/// Likes a post once per user. Returns the post's new like count.
///
/// The insert is conditional on the (post, user) primary key, so a duplicate like
/// (including two concurrent ones) affects no rows and is reported as `Conflict`
/// without touching the counter.
pub async fn like_post(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<i32, AppError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO likes (post_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (post_id, user_id) DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e, Some(POST_CONSTRAINT)) {
            AppError::NotFound("Post not found".to_string())
        } else if is_foreign_key_violation(&e, Some(USER_CONSTRAINT)) {
            AppError::NotFound("User not found".to_string())
        } else {
            AppError::from(e)
        }
    })?
    .rows_affected();

    if inserted == 0 {
        return Err(AppError::Conflict("Already liked".to_string()));
    }

    let likes = increment_counter(&mut tx, post_id, Counter::Likes, inserted as i32)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    tx.commit().await?;

    Ok(likes)
}

/// Removes the caller's like. Unliking a post that was never liked is a no-op.
/// Returns the post's like count afterwards.
pub async fn unlike_post(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<i32, AppError> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let likes = if deleted > 0 {
        decrement_counter(&mut tx, post_id, Counter::Likes, deleted as i32).await?
    } else {
        sqlx::query_scalar::<_, i32>("SELECT likes FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?
    }
    .ok_or(AppError::NotFound("Post not found".to_string()))?;

    tx.commit().await?;

    Ok(likes)
}

/// Removes every like on a post. Only used while the post itself is being deleted.
pub(crate) async fn delete_likes_by_post(
    conn: &mut PgConnection,
    post_id: Uuid,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM likes WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Removes every like given by a user and lowers each affected post's counter
/// by the number of rows removed from it. Runs inside the caller's transaction.
pub(crate) async fn delete_likes_by_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<u64, AppError> {
    let per_post = sqlx::query_as::<_, (Uuid, i32)>(
        r#"
        WITH removed AS (
            DELETE FROM likes WHERE user_id = $1 RETURNING post_id
        ), per_post AS (
            SELECT post_id, COUNT(*)::INTEGER AS removed FROM removed GROUP BY post_id
        )
        UPDATE posts p
        SET likes = GREATEST(p.likes - per_post.removed, 0)
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
