use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{CurrentUser, MaybeUser, cookies},
    config::Config,
    db::{cascade, users},
    error::AppError,
    models::user::{
        ChangePasswordRequest, CheckEmailRequest, CheckNicknameRequest, DuplicateCheckResponse,
        EditProfileRequest, ProfileResponse, own_profile_image,
    },
    storage::{FileStore, delete_files_best_effort},
    utils::hash::{hash_password, verify_password},
};

/// Users may only modify their own account.
fn ensure_self(user: &CurrentUser, target: Uuid) -> Result<(), AppError> {
    if user.id != target {
        return Err(AppError::Forbidden(
            "You can only modify your own account".to_string(),
        ));
    }
    Ok(())
}

/// Public profile of any user.
pub async fn get_profile(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::find_user_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse::from_user(
        user,
        &config.default_profile_image,
    )))
}

/// Change nickname and, optionally, the profile image.
pub async fn edit_profile(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(files): State<Arc<dyn FileStore>>,
    user: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<EditProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_self(&user, user_id)?;
    payload.validate()?;

    let current = users::find_user_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let next_image = if payload.is_profile_image_changed {
        own_profile_image(payload.profile_image.as_deref(), &config.default_profile_image)
    } else {
        current.profile_image.as_deref()
    };

    let replaced = users::update_profile(&pool, user_id, payload.nickname.trim(), next_image)
        .await?;

    delete_files_best_effort(files.as_ref(), replaced).await;

    Ok(Json(serde_json::json!({ "userId": user_id })))
}

/// Change the caller's password. The new password must differ from the current one.
pub async fn change_password(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_self(&user, user_id)?;
    payload.validate()?;

    let current = users::find_user_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let new_password = payload.password.as_str();
    if verify_password(new_password, &current.password)? {
        return Err(AppError::BadRequest(
            "New password must be different from the current password".to_string(),
        ));
    }

    let hashed = hash_password(new_password)?;
    users::update_password(&pool, user_id, &hashed).await?;

    Ok(StatusCode::OK)
}

pub async fn check_email(
    State(pool): State<PgPool>,
    Json(payload): Json<CheckEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    let is_duplicate = users::email_exists(&pool, payload.email.trim()).await?;

    Ok(Json(DuplicateCheckResponse { is_duplicate }))
}

/// The caller's own current nickname is reported as available.
pub async fn check_nickname(
    State(pool): State<PgPool>,
    MaybeUser(caller): MaybeUser,
    Json(payload): Json<CheckNicknameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = users::find_user_id_by_nickname(&pool, payload.nickname.trim()).await?;
    let is_duplicate = owner.is_some_and(|owner| Some(owner) != caller.map(|c| c.id));

    Ok(Json(DuplicateCheckResponse { is_duplicate }))
}

/// Delete the caller's account and everything it owns, then end the session.
pub async fn delete_account(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(files): State<Arc<dyn FileStore>>,
    user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ensure_self(&user, user_id)?;

    cascade::delete_account(
        &pool,
        files.as_ref(),
        user_id,
        &config.default_profile_image,
    )
    .await?;

    Ok((
        [(header::SET_COOKIE, cookies::clear_session_cookie())],
        Json(serde_json::json!({ "message": "Account deleted" })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_owner_passes_ensure_self() {
        let me = CurrentUser { id: Uuid::new_v4() };
        assert!(ensure_self(&me, me.id).is_ok());
        assert!(matches!(
            ensure_self(&me, Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
    }
}
