use crate::database::models::PostRecord;
use crate::database::repositories::{PostRepository, UserRepository};
use crate::database::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::users::{resolve_authors, UserView};
use crate::utils::now_millis;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct PostService {
    database: Database,
}

impl PostService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_post(&self, author_id: &str, input: CreatePostInput) -> ServiceResult<PostView> {
        let text = input
            .text
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ServiceError::bad_request("text required"))?;

        let record = PostRecord {
            id: Uuid::new_v4().to_string(),
            text,
            author_id: author_id.to_string(),
            created_at: now_millis(),
            likes: 0,
        };
        self.database.with_transaction(|repos| -> ServiceResult<()> {
            if repos.users().get(author_id)?.is_none() {
                return Err(ServiceError::bad_request("invalid author"));
            }
            repos.posts().create(&record)?;
            Ok(())
        })?;

        tracing::info!(post_id = %record.id, author_id = %record.author_id, "post created");
        Ok(PostView::from(record))
    }

    /// Newest first, each with its author or `null`.
    pub fn list_posts(&self) -> ServiceResult<Vec<PostListing>> {
        self.database
            .with_repositories(|repos| -> ServiceResult<Vec<PostListing>> {
                let posts = repos.posts().list_recent()?;
                let authors = resolve_authors(&repos, posts.iter().map(|p| p.author_id.as_str()))?;
                Ok(posts
                    .into_iter()
                    .map(|record| PostListing {
                        author: authors.get(&record.author_id).cloned(),
                        post: PostView::from(record),
                    })
                    .collect())
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub created_at: i64,
    pub likes: i64,
}

impl From<PostRecord> for PostView {
    fn from(record: PostRecord) -> Self {
        Self {
            id: record.id,
            text: record.text,
            author_id: record.author_id,
            created_at: record.created_at,
            likes: record.likes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListing {
    #[serde(flatten)]
    pub post: PostView,
    pub author: Option<UserView>,
}
