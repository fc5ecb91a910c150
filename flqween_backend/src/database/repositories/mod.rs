mod content;
mod follows;
mod likes;
mod posts;
mod users;

use super::models::{ContentRecord, FollowRecord, LikeRecord, PostRecord, UserRecord};
use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use std::collections::HashMap;

pub trait UserRepository {
    fn create(&self, record: &UserRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<UserRecord>>;
    fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
    /// Batched lookup; ids without a matching row are skipped.
    fn get_many(&self, ids: &[String]) -> Result<Vec<UserRecord>>;
    fn list(&self) -> Result<Vec<UserRecord>>;
    /// Persists `avatar`, `bio` and `links` of the given record.
    fn update_profile(&self, record: &UserRecord) -> Result<()>;
    fn increment_uploads(&self, id: &str) -> Result<()>;
    fn increment_followers(&self, id: &str) -> Result<()>;
    fn increment_following(&self, id: &str) -> Result<()>;
}

pub trait ContentRepository {
    fn create(&self, record: &ContentRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<ContentRecord>>;
    fn list(&self) -> Result<Vec<ContentRecord>>;
    fn increment_likes(&self, id: &str) -> Result<()>;
}

pub trait PostRepository {
    fn create(&self, record: &PostRecord) -> Result<()>;
    fn list_recent(&self) -> Result<Vec<PostRecord>>;
}

pub trait FollowRepository {
    /// Returns `false` when the edge already existed.
    fn add(&self, record: &FollowRecord) -> Result<bool>;
    /// Every edge where one of `user_ids` is either endpoint, oldest first.
    fn edges_touching(&self, user_ids: &[String]) -> Result<Vec<FollowRecord>>;
}

pub trait LikeRepository {
    /// Returns `false` when the user had already liked the content.
    fn add(&self, record: &LikeRecord) -> Result<bool>;
    fn likers_of(&self, content_id: &str) -> Result<Vec<String>>;
    /// Returns content id -> liker ids, oldest like first.
    fn likers_for(&self, content_ids: &[String]) -> Result<HashMap<String, Vec<String>>>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn users(&self) -> impl UserRepository + '_ {
        users::SqliteUserRepository { conn: self.conn }
    }

    pub fn content(&self) -> impl ContentRepository + '_ {
        content::SqliteContentRepository { conn: self.conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn follows(&self) -> impl FollowRepository + '_ {
        follows::SqliteFollowRepository { conn: self.conn }
    }

    pub fn likes(&self) -> impl LikeRepository + '_ {
        likes::SqliteLikeRepository { conn: self.conn }
    }
}

/// Decodes a JSON string-array column.
pub(super) fn json_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

pub(super) fn encode_list(values: &[String]) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}

/// Upper bound on ids bound into one `IN (...)` list. Longer id lists are
/// queried in chunks of this size.
pub(super) const MAX_BATCH: usize = 500;

/// `?, ?, ?` with `count` placeholders for an `IN (...)` clause.
pub(super) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
