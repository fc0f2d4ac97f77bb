// src/config.rs

use std::env;

/// Maximum number of characters in a post title.
pub const TITLE_MAX_CHARS: usize = 26;
/// Maximum number of characters in a post body.
pub const POST_CONTENT_MAX_CHARS: usize = 500;
/// Maximum number of characters in a comment.
pub const COMMENT_MAX_CHARS: usize = 300;
/// Maximum number of characters in a nickname.
pub const NICKNAME_MAX_CHARS: usize = 10;

/// How long a post stays "already viewed" for one client.
pub const VIEW_WINDOW_SECONDS: u64 = 30 * 60;
/// Upper bound on post ids remembered in the viewed-posts token.
pub const VIEWED_POSTS_CAP: usize = 100;

/// Upload size limit (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Secret used to sign the viewed-posts token.
    pub token_secret: String,
    pub session_ttl_hours: u64,
    pub upload_dir: String,
    pub default_profile_image: String,
    pub cors_origin: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;
        let token_secret = env::var("TOKEN_SECRET")?;

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);

        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        let default_profile_image = env::var("DEFAULT_PROFILE_IMAGE")
            .unwrap_or_else(|_| "default-profile.png".to_string());

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:8000".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database_url,
            token_secret,
            session_ttl_hours,
            upload_dir,
            default_profile_image,
            cors_origin,
            port,
            rust_log,
        })
    }
}
