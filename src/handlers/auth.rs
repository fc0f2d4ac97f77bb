// src/handlers/auth.rs

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    auth::{CurrentUser, cookies, session},
    config::Config,
    db::users,
    error::AppError,
    models::user::{LoginRequest, ProfileResponse, SignupRequest, own_profile_image},
    utils::hash::{hash_password, verify_password},
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the new user id; duplicate email or nickname is 409.
pub async fn signup(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user_id = users::create_user(
        &pool,
        payload.email.trim(),
        &hashed_password,
        payload.nickname.trim(),
        own_profile_image(payload.profile_image.as_deref(), &config.default_profile_image),
    )
    .await?;

    tracing::info!("New user signed up: {}", user_id);

    Ok((StatusCode::CREATED, Json(json!({ "userId": user_id }))))
}

/// Authenticates a user and starts a server-side session.
///
/// Wrong email and wrong password produce the same 401 and reveal nothing about which accounts exist.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invalid = || AppError::AuthError("Invalid email or password".to_string());

    let user = users::find_user_by_email(&pool, payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(invalid());
    }

    let token = session::create_session(&pool, user.id, config.session_ttl_hours).await?;

    Ok((
        [(
            header::SET_COOKIE,
            cookies::session_cookie(&token, config.session_ttl_hours),
        )],
        Json(json!({ "userId": user.id })),
    ))
}

/// Ends the current session. Succeeds even without a session.
pub async fn logout(
    State(pool): State<PgPool>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = cookies::get_cookie_value(&headers, cookies::SESSION_COOKIE) {
        session::delete_session(&pool, token).await?;
    }

    Ok((
        [(header::SET_COOKIE, cookies::clear_session_cookie())],
        Json(json!({ "message": "Logged out" })),
    ))
}

/// Returns the logged-in user's profile, or 401.
pub async fn check(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = users::find_user_by_id(&pool, user.id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse::from_user(
        user,
        &config.default_profile_image,
    )))
}
