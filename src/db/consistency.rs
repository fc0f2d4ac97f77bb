use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

/// A post whose cached counters disagree with its detail rows.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterDrift {
    pub post_id: Uuid,
    pub cached_likes: i32,
    pub actual_likes: i64,
    pub cached_comments: i32,
    pub actual_comments: i64,
}

/// Compares every post's `likes`/`comments` against `COUNT(*)` of its detail rows.
pub async fn find_counter_drift(pool: &PgPool) -> Result<Vec<CounterDrift>, AppError> {
    let drift = sqlx::query_as::<_, CounterDrift>(
        r#"
        SELECT
            p.id AS post_id,
            p.likes AS cached_likes,
            COALESCE(l.n, 0) AS actual_likes,
            p.comments AS cached_comments,
            COALESCE(c.n, 0) AS actual_comments
        FROM posts p
        LEFT JOIN (SELECT post_id, COUNT(*) AS n FROM likes GROUP BY post_id) l
            ON l.post_id = p.id
        LEFT JOIN (SELECT post_id, COUNT(*) AS n FROM comments GROUP BY post_id) c
            ON c.post_id = p.id
        WHERE p.likes <> COALESCE(l.n, 0) OR p.comments <> COALESCE(c.n, 0)
        ORDER BY p.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(drift)
}

/// Resets every drifted counter to its true count in a single statement.
/// Returns the number of posts fixed.
pub async fn repair_counters(pool: &PgPool) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE posts p
        SET likes = t.actual_likes, comments = t.actual_comments
        FROM (
            SELECT
                p2.id,
                COALESCE(l.n, 0)::INTEGER AS actual_likes,
                COALESCE(c.n, 0)::INTEGER AS actual_comments
            FROM posts p2
            LEFT JOIN (SELECT post_id, COUNT(*) AS n FROM likes GROUP BY post_id) l
                ON l.post_id = p2.id
            LEFT JOIN (SELECT post_id, COUNT(*) AS n FROM comments GROUP BY post_id) c
                ON c.post_id = p2.id
        ) t
        WHERE p.id = t.id
          AND (p.likes <> t.actual_likes OR p.comments <> t.actual_comments)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
