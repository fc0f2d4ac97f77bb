// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::{validate_email, validate_nickname, validate_password};

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Unique email address, used to log in.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Unique display name.
    pub nickname: String,

    pub profile_image: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Public profile data. `profile_image` falls back to the default image.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub email: String,
    pub nickname: String,
    pub profile_image: String,
}

impl ProfileResponse {
    pub fn from_user(user: User, default_image: &str) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            nickname: user.nickname,
            profile_image: user
                .profile_image
                .unwrap_or_else(|| default_image.to_string()),
        }
    }
}

/// A requested profile image. Naming the shared default means "no image of my own".
pub fn own_profile_image<'a>(requested: Option<&'a str>, default_image: &str) -> Option<&'a str> {
    requested.filter(|name| *name != default_image)
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(custom(function = "validate_email"))]
    pub email: String,

    #[validate(custom(function = "validate_password"))]
    pub password: String,

    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,

    /// Filename returned by the upload endpoint.
    pub profile_image: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// DTO for editing the caller's profile.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditProfileRequest {
    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,

    /// When true, `profile_image` replaces the current image; `None` resets it to the default.
    #[serde(default)]
    pub is_profile_image_changed: bool,

    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckNicknameRequest {
    pub nickname: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckResponse {
    pub is_duplicate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_collects_every_invalid_field() {
        let req = SignupRequest {
            email: "bad".into(),
            password: "short".into(),
            nickname: "has space".into(),
            profile_image: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("nickname"));
    }

    #[test]
    fn profile_falls_back_to_default_image() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.co".into(),
            password: "hash".into(),
            nickname: "nick".into(),
            profile_image: None,
            created_at: Utc::now(),
        };
        let profile = ProfileResponse::from_user(user, "default.png");
        assert_eq!(profile.profile_image, "default.png");
    }

    #[test]
    fn default_image_request_means_no_own_image() {
        assert_eq!(own_profile_image(Some("default.png"), "default.png"), None);
        assert_eq!(own_profile_image(Some("me.png"), "default.png"), Some("me.png"));
        assert_eq!(own_profile_image(None, "default.png"), None);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.co".into(),
            password: "secret-hash".into(),
            nickname: "nick".into(),
            profile_image: Some("me.png".into()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
