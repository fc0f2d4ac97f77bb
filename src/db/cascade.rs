//! Deletion orchestrators. Each function lists every resource that depends on
//! the entity it removes; database rows go in one transaction, stored files
//! are removed best-effort only after that transaction has committed, and only
//! when their upload record belonged to the account doing the deleting.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{comments, likes, uploads};
use crate::{
    error::AppError,
    storage::{FileStore, delete_files_best_effort},
};

/// Rows removed along with one post.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PostRemoval {
    pub likes: u64,
    pub comments: u64,
}

/// Rows removed along with one account.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AccountRemoval {
    /// Likes the user gave on any post.
    pub likes: u64,
    /// Comments the user wrote on any post.
    pub comments: u64,
    pub posts: u64,
    pub files: usize,
}

/// Deletes a post's likes, comments and the post row. The post must already be locked.
async fn remove_post_rows(conn: &mut PgConnection, post_id: Uuid) -> Result<PostRemoval, AppError> {
    let likes = likes::delete_likes_by_post(conn, post_id).await?;
    let comments = comments::delete_comments_by_post(conn, post_id).await?;

    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    Ok(PostRemoval { likes, comments })
}

/// Author-only post deletion: likes, comments, the post row, then its image if the
/// author owns it.
pub async fn delete_post(
    pool: &PgPool,
    files: &dyn FileStore,
    post_id: Uuid,
    requester_id: Uuid,
) -> Result<PostRemoval, AppError> {
    let mut tx = pool.begin().await?;

    // Locking the row makes concurrent comment/like inserts wait and then fail
    // their foreign-key check instead of leaving orphans.
    let (author_id, post_image) = sqlx::query_as::<_, (Uuid, Option<String>)>(
        "SELECT author_id, post_image FROM posts WHERE id = $1 FOR UPDATE",
    )
    .bind(post_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if author_id != requester_id {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this post".to_string(),
        ));
    }

    let removal = remove_post_rows(&mut tx, post_id).await?;
    let images: Vec<String> = post_image.into_iter().collect();
    let released = uploads::release_uploads(&mut tx, author_id, &images).await?;
    tx.commit().await?;

    tracing::info!(
        "Deleted post {} with {} comments and {} likes",
        post_id,
        removal.comments,
        removal.likes
    );

    delete_files_best_effort(files, &released).await;

    Ok(removal)
}

/// Deletes an account and everything it owns:
///
/// 1. likes the user gave (each affected post's `likes` reconciled)
/// 2. comments the user wrote (each affected post's `comments` reconciled)
/// 3. the user's posts, each with all of its likes and comments
/// 4. the user's upload records
/// 5. the user's sessions
/// 6. the user row
/// 7. after commit: every file the user uploaded (never the shared default image)
pub async fn delete_account(
    pool: &PgPool,
    files: &dyn FileStore,
    user_id: Uuid,
    default_profile_image: &str,
) -> Result<AccountRemoval, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let mut removal = AccountRemoval {
        likes: likes::delete_likes_by_user(&mut tx, user_id).await?,
        comments: comments::delete_comments_by_user(&mut tx, user_id).await?,
        ..AccountRemoval::default()
    };

    let posts = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM posts WHERE author_id = $1 ORDER BY id FOR UPDATE",
    )
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await?;

    for post_id in posts {
        remove_post_rows(&mut tx, post_id).await?;
        removal.posts += 1;
    }

    let mut stored_files = uploads::release_all_uploads(&mut tx, user_id).await?;
    stored_files.retain(|name| name != default_profile_image);

    sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    removal.files = stored_files.len();

    tracing::info!(
        "Deleted account {}: {} posts, {} comments, {} likes, {} files",
        user_id,
        removal.posts,
        removal.comments,
        removal.likes,
        removal.files
    );

    delete_files_best_effort(files, &stored_files).await;

    Ok(removal)
}
