// src/db/mod.rs
//
// Persistence operations. Every write that touches `comments` or `likes` adjusts
// the parent post's cached counter inside the same transaction.

pub mod cascade;
pub mod comments;
pub mod consistency;
pub mod likes;
pub mod posts;
pub mod uploads;
pub mod users;
