//! Ownership of stored files. A file reference is only accepted from the account
//! that uploaded it, and a file is only deleted when its owner releases it.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppError;

/// Records a freshly stored file. `owner` is `None` for uploads made before signup.
pub async fn record_upload(pool: &PgPool, filename: &str, owner: Option<Uuid>) -> Result<(), AppError> {
    sqlx::query("INSERT INTO uploads (filename, owner_id) VALUES ($1, $2)")
        .bind(filename)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(())
}

/// Attaches an upload to a post or profile of `user_id`, taking ownership of it if
/// it has none. Uploads owned by anyone else, uploads already attached, and names
/// that were never uploaded (the shared default image included) are rejected.
pub(crate) async fn attach_upload(
    conn: &mut PgConnection,
    filename: &str,
    user_id: Uuid,
) -> Result<(), AppError> {
    let claimed = sqlx::query_scalar::<_, String>(
        r#"
        UPDATE uploads SET owner_id = $2, attached = TRUE
        WHERE filename = $1
          AND NOT attached
          AND (owner_id IS NULL OR owner_id = $2)
        RETURNING filename
        "#,
    )
    .bind(filename)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    if claimed.is_none() {
        return Err(AppError::BadRequest(format!(
            "Unknown image reference: {}",
            filename
        )));
    }
    Ok(())
}

/// Drops the ownership records for the given files owned by `owner_id`.
/// Returns only the names that were released; those are safe to delete from storage.
pub(crate) async fn release_uploads(
    conn: &mut PgConnection,
    owner_id: Uuid,
    filenames: &[String],
) -> Result<Vec<String>, AppError> {
    if filenames.is_empty() {
        return Ok(Vec::new());
    }

    let released = sqlx::query_scalar::<_, String>(
        "DELETE FROM uploads WHERE owner_id = $1 AND filename = ANY($2) RETURNING filename",
    )
    .bind(owner_id)
    .bind(filenames)
    .fetch_all(&mut *conn)
    .await?;

    Ok(released)
}

/// Drops every ownership record of a user. Returns the released names.
pub(crate) async fn release_all_uploads(
    conn: &mut PgConnection,
    owner_id: Uuid,
) -> Result<Vec<String>, AppError> {
    let released = sqlx::query_scalar::<_, String>(
        "DELETE FROM uploads WHERE owner_id = $1 RETURNING filename",
    )
    .bind(owner_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(released)
}
