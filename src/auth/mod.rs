// src/auth/mod.rs

pub mod cookies;
pub mod session;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller, resolved from the session cookie.
/// Handlers receive it explicitly instead of reading ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
}

/// Extractor that requires authentication.
/// Returns 401 if no valid session found.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookies::get_cookie_value(&parts.headers, cookies::SESSION_COOKIE)
            .ok_or_else(|| AppError::AuthError("Login required".to_string()))?;

        let user_id = session::find_session_user(&state.pool, token)
            .await?
            .ok_or_else(|| AppError::AuthError("Login required".to_string()))?;

        Ok(CurrentUser { id: user_id })
    }
}

/// Optional user extractor: `None` instead of 401 when not authenticated.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::AuthError(_)) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}
