use crate::database::models::{ContentRecord, LikeRecord};
use crate::database::repositories::{ContentRepository, LikeRepository, UserRepository};
use crate::database::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::files::{StoredFile, UploadStore, UploadedFile};
use crate::users::{resolve_authors, UserView};
use crate::utils::{now_millis, now_utc_iso};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct ContentService {
    database: Database,
    store: UploadStore,
}

impl ContentService {
    pub fn new(database: Database, store: UploadStore) -> Self {
        Self { database, store }
    }

    /// Every content item, newest first, with its author resolved through a
    /// single batched lookup.
    pub fn list_content(&self) -> ServiceResult<Vec<ContentListing>> {
        self.database
            .with_repositories(|repos| -> ServiceResult<Vec<ContentListing>> {
                let items = repos.content().list()?;
                let ids: Vec<String> = items.iter().map(|c| c.id.clone()).collect();
                let mut likers = repos.likes().likers_for(&ids)?;
                let authors = resolve_authors(&repos, items.iter().map(|c| c.author_id.as_str()))?;
                Ok(items
                    .into_iter()
                    .map(|record| {
                        let author = authors.get(&record.author_id).cloned();
                        let liked_by = likers.remove(&record.id).unwrap_or_default();
                        ContentListing {
                            content: ContentView::from_record(record, liked_by),
                            author,
                        }
                    })
                    .collect())
            })
    }

    /// Stores the uploaded files and persists the content record. The insert
    /// and the author's upload counter commit in one transaction; when that
    /// fails the freshly written files are removed again.
    pub async fn upload_content(&self, input: UploadContentInput) -> ServiceResult<ContentView> {
        let author_id = input
            .author_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::bad_request("invalid author"))?
            .to_string();
        self.ensure_author(&author_id)?;

        let title = input.title.unwrap_or_default();
        let tags = parse_tags(input.tags.as_deref())?;
        let price = parse_price(input.price.as_deref())?;
        if input.files.is_empty() {
            return Err(ServiceError::bad_request("files required"));
        }

        let mut written: Vec<StoredFile> = Vec::new();
        let stored = self
            .store_all(&input.files, &input.cover, &input.screenshots, &mut written)
            .await;
        let (file_paths, thumbnail, screenshots) = match stored {
            Ok(paths) => paths,
            Err(err) => {
                self.discard(&written).await;
                return Err(ServiceError::Storage(err));
            }
        };

        let record = ContentRecord {
            id: Uuid::new_v4().to_string(),
            title,
            description: input.description.unwrap_or_default(),
            tags,
            price,
            content_type: input.content_type.unwrap_or_default(),
            author_id: author_id.clone(),
            likes: 0,
            downloads: 0,
            created_at: now_millis(),
            thumbnail,
            screenshots,
            file_paths,
        };

        let persisted = self
            .database
            .with_transaction(|repos| -> ServiceResult<()> {
                if repos.users().get(&author_id)?.is_none() {
                    return Err(ServiceError::bad_request("invalid author"));
                }
                repos.content().create(&record)?;
                repos.users().increment_uploads(&author_id)?;
                Ok(())
            });
        if let Err(err) = persisted {
            self.discard(&written).await;
            return Err(err);
        }

        tracing::info!(
            content_id = %record.id,
            author_id = %record.author_id,
            files = record.file_paths.len(),
            "content uploaded"
        );
        Ok(ContentView::from_record(record, Vec::new()))
    }

    /// Records a like from `user_id`. Liking twice returns the content
    /// unchanged.
    pub fn like_content(&self, content_id: &str, user_id: &str) -> ServiceResult<ContentView> {
        self.database
            .with_transaction(|repos| -> ServiceResult<ContentView> {
                let Some(mut record) = repos.content().get(content_id)? else {
                    return Err(ServiceError::not_found("not found"));
                };
                if repos.users().get(user_id)?.is_none() {
                    return Err(ServiceError::not_found("not found"));
                }
                let inserted = repos.likes().add(&LikeRecord {
                    content_id: content_id.to_string(),
                    user_id: user_id.to_string(),
                    created_at: now_utc_iso(),
                })?;
                if inserted {
                    repos.content().increment_likes(content_id)?;
                    record.likes += 1;
                }
                let liked_by = repos.likes().likers_of(content_id)?;
                Ok(ContentView::from_record(record, liked_by))
            })
    }

    fn ensure_author(&self, author_id: &str) -> ServiceResult<()> {
        self.database
            .with_repositories(|repos| -> ServiceResult<()> {
                match repos.users().get(author_id)? {
                    Some(_) => Ok(()),
                    None => Err(ServiceError::bad_request("invalid author")),
                }
            })
    }

    async fn store_all(
        &self,
        files: &[UploadedFile],
        cover: &Option<UploadedFile>,
        screenshots: &[UploadedFile],
        written: &mut Vec<StoredFile>,
    ) -> anyhow::Result<(Vec<String>, String, Vec<String>)> {
        let mut file_paths = Vec::with_capacity(files.len());
        for file in files {
            let stored = self.store.save(file).await?;
            file_paths.push(stored.public_path.clone());
            written.push(stored);
        }

        let mut thumbnail = String::new();
        if let Some(cover) = cover {
            let stored = self.store.save(cover).await?;
            thumbnail = stored.public_path.clone();
            written.push(stored);
        }

        let mut screenshot_paths = Vec::with_capacity(screenshots.len());
        for shot in screenshots {
            let stored = self.store.save(shot).await?;
            screenshot_paths.push(stored.public_path.clone());
            written.push(stored);
        }

        Ok((file_paths, thumbnail, screenshot_paths))
    }

    async fn discard(&self, written: &[StoredFile]) {
        for stored in written {
            self.store.remove(stored).await;
        }
    }
}

/// `tags` arrives as a JSON-encoded array of strings; absent or blank means
/// no tags.
fn parse_tags(raw: Option<&str>) -> ServiceResult<Vec<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(raw) => serde_json::from_str::<Vec<String>>(raw)
            .map_err(|_| ServiceError::bad_request("tags must be a JSON array of strings")),
    }
}

fn parse_price(raw: Option<&str>) -> ServiceResult<f64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0.0),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|price| price.is_finite())
            .ok_or_else(|| ServiceError::bad_request("invalid price")),
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadContentInput {
    pub title: Option<String>,
    pub description: Option<String>,
    /// JSON-encoded list of tags.
    pub tags: Option<String>,
    pub price: Option<String>,
    pub author_id: Option<String>,
    pub content_type: Option<String>,
    pub files: Vec<UploadedFile>,
    pub cover: Option<UploadedFile>,
    pub screenshots: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub price: f64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub author_id: String,
    pub likes: i64,
    pub downloads: i64,
    pub created_at: i64,
    pub thumbnail: String,
    pub screenshots: Vec<String>,
    pub file_paths: Vec<String>,
    pub liked_by: Vec<String>,
}

impl ContentView {
    fn from_record(record: ContentRecord, liked_by: Vec<String>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            tags: record.tags,
            price: record.price,
            content_type: record.content_type,
            author_id: record.author_id,
            likes: record.likes,
            downloads: record.downloads,
            created_at: record.created_at,
            thumbnail: record.thumbnail,
            screenshots: record.screenshots,
            file_paths: record.file_paths,
            liked_by,
        }
    }
}

/// Content plus its resolved author; `author` is `null` when the author row
/// is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentListing {
    #[serde(flatten)]
    pub content: ContentView,
    pub author: Option<UserView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenSigner;
    use crate::config::FlqweenPaths;
    use crate::users::{RegisterInput, UserService};
    use chrono::Duration;
    use rusqlite::Connection;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _temp: TempDir,
        paths: FlqweenPaths,
        content: ContentService,
        users: UserService,
    }

    fn setup() -> Fixture {
        let temp = tempdir().expect("tempdir");
        let paths = FlqweenPaths::from_base_dir(temp.path()).expect("paths");
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        Fixture {
            content: ContentService::new(db.clone(), UploadStore::new(&paths)),
            users: UserService::new(db, TokenSigner::new(b"unit-test-secret", Duration::days(7))),
            paths,
            _temp: temp,
        }
    }

    fn register(users: &UserService, name: &str) -> UserView {
        users
            .register(RegisterInput {
                username: Some(name.into()),
                email: Some(format!("{name}@x.com")),
            })
            .expect("register")
            .user
    }

    fn file(name: &str, data: &[u8]) -> UploadedFile {
        UploadedFile {
            original_name: Some(name.into()),
            data: data.to_vec(),
        }
    }

    fn upload_input(author_id: &str) -> UploadContentInput {
        UploadContentInput {
            title: Some("Loop pack".into()),
            description: Some("Eight loops".into()),
            tags: Some(r#"["ambient","loops"]"#.into()),
            price: Some("9.99".into()),
            author_id: Some(author_id.into()),
            content_type: Some("audio".into()),
            files: vec![file("pack.zip", b"zip-bytes")],
            cover: Some(file("cover.png", b"png")),
            screenshots: vec![file("a.png", b"a"), file("b.png", b"b")],
        }
    }

    fn uploads_count(paths: &FlqweenPaths) -> usize {
        std::fs::read_dir(&paths.uploads_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn upload_stores_files_and_bumps_counter() {
        let fx = setup();
        let author = register(&fx.users, "maker");

        let view = fx
            .content
            .upload_content(upload_input(&author.id))
            .await
            .expect("upload");

        assert_eq!(view.tags, vec!["ambient".to_string(), "loops".to_string()]);
        assert_eq!(view.price, 9.99);
        assert_eq!(view.likes, 0);
        assert_eq!(view.file_paths.len(), 1);
        assert!(view.file_paths[0].starts_with("/uploads/"));
        assert!(view.thumbnail.ends_with("_cover.png"));
        assert_eq!(view.screenshots.len(), 2);
        assert!(view.screenshots[0].ends_with("_a.png"));
        assert_eq!(uploads_count(&fx.paths), 4);

        assert_eq!(fx.users.get_profile(&author.id).unwrap().uploads, 1);
    }

    #[tokio::test]
    async fn unknown_author_creates_nothing() {
        let fx = setup();
        let err = fx
            .content
            .upload_content(upload_input("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(ref msg) if msg == "invalid author"));
        assert!(fx.content.list_content().unwrap().is_empty());
        assert_eq!(uploads_count(&fx.paths), 0);
    }

    #[tokio::test]
    async fn upload_requires_primary_files() {
        let fx = setup();
        let author = register(&fx.users, "maker");
        let mut input = upload_input(&author.id);
        input.files.clear();
        let err = fx.content.upload_content(input).await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert_eq!(fx.users.get_profile(&author.id).unwrap().uploads, 0);
    }

    #[tokio::test]
    async fn malformed_tags_and_price_are_rejected() {
        let fx = setup();
        let author = register(&fx.users, "maker");

        let mut input = upload_input(&author.id);
        input.tags = Some("ambient, loops".into());
        assert!(matches!(
            fx.content.upload_content(input).await,
            Err(ServiceError::BadRequest(_))
        ));

        let mut input = upload_input(&author.id);
        input.price = Some("free".into());
        assert!(matches!(
            fx.content.upload_content(input).await,
            Err(ServiceError::BadRequest(_))
        ));
        assert_eq!(uploads_count(&fx.paths), 0);
    }

    #[tokio::test]
    async fn like_is_idempotent() {
        let fx = setup();
        let author = register(&fx.users, "maker");
        let fan = register(&fx.users, "fan");
        let view = fx
            .content
            .upload_content(upload_input(&author.id))
            .await
            .unwrap();

        let first = fx.content.like_content(&view.id, &fan.id).unwrap();
        assert_eq!(first.likes, 1);
        assert_eq!(first.liked_by, vec![fan.id.clone()]);

        let second = fx.content.like_content(&view.id, &fan.id).unwrap();
        assert_eq!(second.likes, 1);
        assert_eq!(second.liked_by, vec![fan.id.clone()]);

        assert!(matches!(
            fx.content.like_content("missing", &fan.id),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listing_resolves_authors() {
        let fx = setup();
        let author = register(&fx.users, "maker");
        fx.content
            .upload_content(upload_input(&author.id))
            .await
            .unwrap();

        let listing = fx.content.list_content().unwrap();
        assert_eq!(listing.len(), 1);
        let resolved = listing[0].author.as_ref().expect("author resolved");
        assert_eq!(resolved.id, author.id);

        let json = serde_json::to_value(&listing[0]).unwrap();
        assert_eq!(json["type"], "audio");
        assert_eq!(json["authorId"], author.id.as_str());
        assert!(json.get("likedBy").is_some());
        assert_eq!(json["author"]["username"], "maker");
    }

    #[test]
    fn listing_keeps_null_author_for_missing_user() {
        use crate::database::repositories::SqliteRepositories;
        use crate::database::MIGRATIONS;

        let temp = tempdir().expect("tempdir");
        let paths = FlqweenPaths::from_base_dir(temp.path()).expect("paths");
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(MIGRATIONS).expect("migrations");
        conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
        SqliteRepositories::new(&conn)
            .content()
            .create(&ContentRecord {
                id: "orphan".into(),
                title: "Orphan".into(),
                description: String::new(),
                tags: vec![],
                price: 0.0,
                content_type: "audio".into(),
                author_id: "ghost".into(),
                likes: 0,
                downloads: 0,
                created_at: 1,
                thumbnail: String::new(),
                screenshots: vec![],
                file_paths: vec!["/uploads/1_a.zip".into()],
            })
            .unwrap();
        let service = ContentService::new(
            Database::from_connection(conn, true),
            UploadStore::new(&paths),
        );

        let listing = service.list_content().unwrap();
        assert_eq!(listing.len(), 1);
        assert!(listing[0].author.is_none());
        let json = serde_json::to_value(&listing[0]).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("author"));
        assert!(json["author"].is_null());
        assert_eq!(json["authorId"], "ghost");
    }

    #[test]
    fn parses_optional_numeric_and_json_fields() {
        assert_eq!(parse_price(None).unwrap(), 0.0);
        assert_eq!(parse_price(Some(" 3.5 ")).unwrap(), 3.5);
        assert!(parse_price(Some("NaN")).is_err());
        assert!(parse_tags(Some("")).unwrap().is_empty());
        assert!(parse_tags(Some("{}")).is_err());
    }
}
