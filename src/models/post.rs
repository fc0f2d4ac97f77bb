use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::{validate_post_content, validate_title};

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub post_image: Option<String>,

    pub likes: i32,
    pub views: i32,
    pub comments: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post joined with its author's public profile, as shown in lists and detail views.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub post_image: Option<String>,
    pub likes: i32,
    pub views: i32,
    pub comments: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub nickname: String,
    pub profile_image: Option<String>,

    /// Whether the caller has liked this post. Populated only in detail queries.
    #[sqlx(default)]
    pub is_liked: bool,
}

/// DTO for creating a new post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: String,

    #[validate(custom(function = "validate_post_content"))]
    pub content: String,

    /// Filename returned by the upload endpoint.
    pub post_image: Option<String>,
}

/// DTO for editing a post. The image is kept unless replaced or explicitly removed.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditPostRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: String,

    #[validate(custom(function = "validate_post_content"))]
    pub content: String,

    pub post_image: Option<String>,

    #[serde(default)]
    pub is_image_deleted: bool,
}

/// Query parameters for listing posts.
#[derive(Debug, Deserialize)]
pub struct PostListParams {
    /// Cursor for pagination: the createdAt timestamp of the last post in the previous page.
    pub cursor: Option<DateTime<Utc>>,

    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.to_string(),
            content: "body".to_string(),
            post_image: None,
        }
    }

    #[test]
    fn title_of_26_chars_is_accepted() {
        assert!(request(&"t".repeat(26)).validate().is_ok());
    }

    #[test]
    fn title_of_27_chars_is_rejected() {
        let errors = request(&"t".repeat(27)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn edit_request_defaults_to_keeping_the_image() {
        let req: EditPostRequest =
            serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        assert!(!req.is_image_deleted);
        assert!(req.post_image.is_none());
    }
}
