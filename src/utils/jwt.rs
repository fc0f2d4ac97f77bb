// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{VIEW_WINDOW_SECONDS, VIEWED_POSTS_CAP},
    error::AppError,
};

/// Claims of the client-held "viewed posts" token.
///
/// The client carries this in a cookie; the server only trusts it because it is signed.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ViewedPosts {
    /// Post ids viewed within the current window, oldest first.
    pub posts: Vec<Uuid>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl ViewedPosts {
    pub fn contains(&self, post_id: Uuid) -> bool {
        self.posts.contains(&post_id)
    }

    /// Records a view and restarts the window. Keeps only the most recent ids.
    pub fn record(&mut self, post_id: Uuid) -> Result<(), AppError> {
        if !self.contains(post_id) {
            self.posts.push(post_id);
        }
        if self.posts.len() > VIEWED_POSTS_CAP {
            let excess = self.posts.len() - VIEWED_POSTS_CAP;
            self.posts.drain(..excess);
        }
        self.exp = now_secs()? + VIEW_WINDOW_SECONDS as usize;
        Ok(())
    }
}

fn now_secs() -> Result<usize, AppError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize)
}

/// Signs the viewed-posts claims.
pub fn sign_viewed_posts(viewed: &ViewedPosts, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        viewed,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Decodes a viewed-posts token.
///
/// A missing, expired or tampered token is treated as "nothing viewed yet".
pub fn read_viewed_posts(token: Option<&str>, secret: &str) -> ViewedPosts {
    let Some(token) = token else {
        return ViewedPosts::default();
    };

    match decode::<ViewedPosts>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!("Ignoring viewed-posts token: {}", e);
            ViewedPosts::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "view_token_test_secret";

    #[test]
    fn recorded_views_survive_a_round_trip() {
        let post = Uuid::new_v4();
        let mut viewed = ViewedPosts::default();
        viewed.record(post).unwrap();

        let token = sign_viewed_posts(&viewed, SECRET).unwrap();
        let read = read_viewed_posts(Some(&token), SECRET);

        assert!(read.contains(post));
        assert!(!read.contains(Uuid::new_v4()));
    }

    #[test]
    fn recording_twice_keeps_one_entry() {
        let post = Uuid::new_v4();
        let mut viewed = ViewedPosts::default();
        viewed.record(post).unwrap();
        viewed.record(post).unwrap();
        assert_eq!(viewed.posts.len(), 1);
    }

    #[test]
    fn window_is_thirty_minutes() {
        let mut viewed = ViewedPosts::default();
        viewed.record(Uuid::new_v4()).unwrap();
        let now = now_secs().unwrap();
        assert!(viewed.exp >= now + 1799 && viewed.exp <= now + 1800);
    }

    #[test]
    fn expired_token_counts_as_empty() {
        let viewed = ViewedPosts {
            posts: vec![Uuid::new_v4()],
            exp: now_secs().unwrap() - 3600,
        };
        let token = sign_viewed_posts(&viewed, SECRET).unwrap();
        assert_eq!(read_viewed_posts(Some(&token), SECRET), ViewedPosts::default());
    }

    #[test]
    fn token_signed_with_another_secret_counts_as_empty() {
        let mut viewed = ViewedPosts::default();
        viewed.record(Uuid::new_v4()).unwrap();
        let token = sign_viewed_posts(&viewed, "someone_else").unwrap();
        assert!(read_viewed_posts(Some(&token), SECRET).posts.is_empty());
        assert!(read_viewed_posts(Some("garbage"), SECRET).posts.is_empty());
        assert!(read_viewed_posts(None, SECRET).posts.is_empty());
    }

    #[test]
    fn keeps_only_the_most_recent_ids() {
        let mut viewed = ViewedPosts::default();
        let ids: Vec<Uuid> = (0..VIEWED_POSTS_CAP + 5).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            viewed.record(*id).unwrap();
        }
        assert_eq!(viewed.posts.len(), VIEWED_POSTS_CAP);
        assert!(!viewed.contains(ids[0]));
        assert!(viewed.contains(ids[ids.len() - 1]));
    }
}
