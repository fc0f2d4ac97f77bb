use sqlx::PgPool;
use uuid::Uuid;

use super::uploads;
use crate::{
    error::{AppError, is_unique_violation},
    models::user::User,
};

const EMAIL_CONSTRAINT: &str = "users_email_key";
const NICKNAME_CONSTRAINT: &str = "users_nickname_key";

/// Maps unique violations on email/nickname to a `Conflict` naming the field.
fn map_unique(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e, Some(EMAIL_CONSTRAINT)) {
        AppError::Conflict("Email is already in use".to_string())
    } else if is_unique_violation(&e, Some(NICKNAME_CONSTRAINT)) {
        AppError::Conflict("Nickname is already in use".to_string())
    } else {
        tracing::error!("User write failed: {:?}", e);
        AppError::from(e)
    }
}

/// `profile_image` must be an unattached upload that nobody owns yet.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    nickname: &str,
    profile_image: Option<&str>,
) -> Result<Uuid, AppError> {
    let mut tx = pool.begin().await?;
    let user_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password, nickname, profile_image)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(password_hash)
    .bind(nickname)
    .bind(profile_image)
    .execute(&mut *tx)
    .await
    .map_err(map_unique)?;

    if let Some(image) = profile_image {
        uploads::attach_upload(&mut tx, image, user_id).await?;
    }

    tx.commit().await?;

    Ok(user_id)
}

pub async fn find_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password, nickname, profile_image, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password, nickname, profile_image, created_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Owner of a nickname, if taken.
pub async fn find_user_id_by_nickname(pool: &PgPool, nickname: &str) -> Result<Option<Uuid>, AppError> {
    let user_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE nickname = $1")
        .bind(nickname)
        .fetch_optional(pool)
        .await?;
    Ok(user_id)
}

/// Updates nickname and image. A new image must be an unattached upload of the user.
/// Returns the previous image when it changed and the user owned it.
pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    nickname: &str,
    profile_image: Option<&str>,
) -> Result<Option<String>, AppError> {
    let mut tx = pool.begin().await?;

    let previous = sqlx::query_scalar::<_, Option<String>>(
        "SELECT profile_image FROM users WHERE id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    sqlx::query("UPDATE users SET nickname = $2, profile_image = $3 WHERE id = $1")
        .bind(user_id)
        .bind(nickname)
        .bind(profile_image)
        .execute(&mut *tx)
        .await
        .map_err(map_unique)?;

    if previous.as_deref() != profile_image {
        if let Some(image) = profile_image {
            uploads::attach_upload(&mut tx, image, user_id).await?;
        }
    }

    let replaced: Vec<String> = previous
        .filter(|prev| Some(prev.as_str()) != profile_image)
        .into_iter()
        .collect();
    let released = uploads::release_uploads(&mut tx, user_id, &replaced).await?;

    tx.commit().await?;

    Ok(released.into_iter().next())
}

pub async fn update_password(pool: &PgPool, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
    let updated = sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}
