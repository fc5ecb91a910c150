use crate::auth::TokenSigner;
use crate::database::models::UserRecord;
use crate::database::repositories::{FollowRepository, SqliteRepositories, UserRepository};
use crate::database::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    database: Database,
    tokens: TokenSigner,
}

impl UserService {
    pub fn new(database: Database, tokens: TokenSigner) -> Self {
        Self { database, tokens }
    }

    /// Creates an account with zeroed counters and returns it with a fresh
    /// token.
    pub fn register(&self, input: RegisterInput) -> ServiceResult<Session> {
        let (Some(username), Some(email)) = (non_blank(input.username), non_blank(input.email))
        else {
            return Err(ServiceError::bad_request("username and email required"));
        };

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            avatar: String::new(),
            bio: String::new(),
            links: Vec::new(),
            uploads: 0,
            followers: 0,
            following: 0,
            total_likes: 0,
            created_at: now_utc_iso(),
        };

        self.database.with_transaction(|repos| -> ServiceResult<()> {
            if repos.users().get_by_email(&record.email)?.is_some() {
                return Err(ServiceError::Conflict("email exists".into()));
            }
            repos.users().create(&record)?;
            Ok(())
        })?;

        tracing::info!(user_id = %record.id, "registered user");
        let token = self.tokens.issue(&record.id)?;
        Ok(Session {
            user: UserView::from_record(record, Vec::new(), Vec::new()),
            token,
        })
    }

    /// Issues a fresh token for the account with the given email. There is
    /// no credential check.
    pub fn login(&self, input: LoginInput) -> ServiceResult<Session> {
        let email =
            non_blank(input.email).ok_or_else(|| ServiceError::bad_request("email required"))?;
        let user = self
            .database
            .with_repositories(|repos| -> ServiceResult<UserView> {
                let record = repos
                    .users()
                    .get_by_email(&email)?
                    .ok_or_else(|| ServiceError::not_found("user not found"))?;
                Ok(load_view(&repos, record)?)
            })?;
        let token = self.tokens.issue(&user.id)?;
        Ok(Session { user, token })
    }

    pub fn get_profile(&self, id: &str) -> ServiceResult<UserView> {
        self.database.with_repositories(|repos| -> ServiceResult<UserView> {
            let record = repos
                .users()
                .get(id)?
                .ok_or_else(|| ServiceError::not_found("not found"))?;
            Ok(load_view(&repos, record)?)
        })
    }

    /// Overwrites only the supplied fields.
    pub fn update_profile(&self, id: &str, input: UpdateProfileInput) -> ServiceResult<UserView> {
        self.database.with_transaction(|repos| -> ServiceResult<UserView> {
            let mut record = repos
                .users()
                .get(id)?
                .ok_or_else(|| ServiceError::not_found("not found"))?;
            if let Some(bio) = input.bio {
                record.bio = bio;
            }
            if let Some(links) = input.links {
                record.links = links;
            }
            if let Some(avatar) = input.avatar {
                record.avatar = avatar;
            }
            repos.users().update_profile(&record)?;
            Ok(load_view(&repos, record)?)
        })
    }

    pub fn list_users(&self) -> ServiceResult<Vec<UserView>> {
        self.database.with_repositories(|repos| -> ServiceResult<Vec<UserView>> {
            let records = repos.users().list()?;
            Ok(load_views(&repos, records)?)
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterInput {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileInput {
    pub bio: Option<String>,
    pub links: Option<Vec<String>>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: UserView,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
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
    pub followers_list: Vec<String>,
    pub following_list: Vec<String>,
}

impl UserView {
    fn from_record(
        record: UserRecord,
        followers_list: Vec<String>,
        following_list: Vec<String>,
    ) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            avatar: record.avatar,
            bio: record.bio,
            links: record.links,
            uploads: record.uploads,
            followers: record.followers,
            following: record.following,
            total_likes: record.total_likes,
            followers_list,
            following_list,
        }
    }
}

pub(crate) fn load_view(repos: &SqliteRepositories<'_>, record: UserRecord) -> Result<UserView> {
    let mut views = load_views(repos, vec![record])?;
    Ok(views.remove(0))
}

/// Attaches follower/following id lists to the given users with one edge
/// query.
pub(crate) fn load_views(
    repos: &SqliteRepositories<'_>,
    records: Vec<UserRecord>,
) -> Result<Vec<UserView>> {
    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    let edges = repos.follows().edges_touching(&ids)?;

    let mut followers: HashMap<&str, Vec<String>> = HashMap::new();
    let mut following: HashMap<&str, Vec<String>> = HashMap::new();
    for edge in &edges {
        followers
            .entry(edge.followee_id.as_str())
            .or_default()
            .push(edge.follower_id.clone());
        following
            .entry(edge.follower_id.as_str())
            .or_default()
            .push(edge.followee_id.clone());
    }

    Ok(records
        .into_iter()
        .map(|record| {
            let followers_list = followers.remove(record.id.as_str()).unwrap_or_default();
            let following_list = following.remove(record.id.as_str()).unwrap_or_default();
            UserView::from_record(record, followers_list, following_list)
        })
        .collect())
}

/// Batched author lookup for listings. Unknown ids are absent from the map.
pub(crate) fn resolve_authors<'a>(
    repos: &SqliteRepositories<'_>,
    author_ids: impl IntoIterator<Item = &'a str>,
) -> Result<HashMap<String, UserView>> {
    let ids: Vec<String> = author_ids
        .into_iter()
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let records = repos.users().get_many(&ids)?;
    Ok(load_views(repos, records)?
        .into_iter()
        .map(|view| (view.id.clone(), view))
        .collect())
}
