pub mod models;
pub mod repositories;

use crate::config::FlqweenPaths;
use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) const MIGRATIONS: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        avatar TEXT NOT NULL DEFAULT '',
        bio TEXT NOT NULL DEFAULT '',
        links TEXT NOT NULL DEFAULT '[]',
        uploads INTEGER NOT NULL DEFAULT 0,
        followers INTEGER NOT NULL DEFAULT 0,
        following INTEGER NOT NULL DEFAULT 0,
        total_likes INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS content (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        tags TEXT NOT NULL DEFAULT '[]',
        price REAL NOT NULL DEFAULT 0,
        content_type TEXT NOT NULL DEFAULT '',
        author_id TEXT NOT NULL,
        likes INTEGER NOT NULL DEFAULT 0,
        downloads INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        thumbnail TEXT NOT NULL DEFAULT '',
        screenshots TEXT NOT NULL DEFAULT '[]',
        file_paths TEXT NOT NULL DEFAULT '[]',
        FOREIGN KEY (author_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        text TEXT NOT NULL,
        author_id TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        likes INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (author_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS follows (
        follower_id TEXT NOT NULL,
        followee_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (follower_id, followee_id),
        FOREIGN KEY (follower_id) REFERENCES users(id),
        FOREIGN KEY (followee_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS content_likes (
        content_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (content_id, user_id),
        FOREIGN KEY (content_id) REFERENCES content(id),
        FOREIGN KEY (user_id) REFERENCES users(id)
    );

    CREATE INDEX IF NOT EXISTS idx_content_author ON content(author_id);
    CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);
    CREATE INDEX IF NOT EXISTS idx_follows_followee ON follows(followee_id);
"#;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    newly_created: bool,
}

impl Database {
    pub fn connect(paths: &FlqweenPaths) -> Result<Self> {
        let newly_created = !paths.db_path.exists();
        let conn = Connection::open(&paths.db_path)
            .with_context(|| format!("failed to open database {}", paths.db_path.display()))?;
        Ok(Self::from_connection(conn, newly_created))
    }

    pub fn from_connection(conn: Connection, newly_created: bool) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            newly_created,
        }
    }

    /// Applies the schema. Returns whether the database file was created by
    /// this process.
    pub fn ensure_migrations(&self) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATIONS)
                .context("failed to apply migrations")?;
            Ok(())
        })?;
        Ok(self.newly_created)
    }

    /// Runs `f` against the shared connection. Statements execute in
    /// autocommit mode.
    pub fn with_repositories<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> Result<T, E>,
        E: From<anyhow::Error>,
    {
        let guard = self.lock().map_err(E::from)?;
        f(repositories::SqliteRepositories::new(&guard))
    }

    /// Runs `f` inside a single SQLite transaction. The transaction commits
    /// only when `f` succeeds; any error rolls every statement back.
    pub fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> Result<T, E>,
        E: From<anyhow::Error>,
    {
        let mut guard = self.lock().map_err(E::from)?;
        let tx = guard
            .transaction()
            .context("failed to begin transaction")
            .map_err(E::from)?;
        let value = f(repositories::SqliteRepositories::new(&tx))?;
        tx.commit()
            .context("failed to commit transaction")
            .map_err(E::from)?;
        Ok(value)
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self.lock()?;
        f(&guard)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }
}
