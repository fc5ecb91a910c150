use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
    pub links: Vec<String>,
    pub uploads: i64,
    pub followers: i64,
    pub following: i64,
    pub total_likes: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub price: f64,
    pub content_type: String,
    pub author_id: String,
    pub likes: i64,
    pub downloads: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub thumbnail: String,
    pub screenshots: Vec<String>,
    pub file_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub text: String,
    pub author_id: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub likes: i64,
}

/// Directed edge: `follower_id` follows `followee_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRecord {
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeRecord {
    pub content_id: String,
    pub user_id: String,
    pub created_at: String,
}
