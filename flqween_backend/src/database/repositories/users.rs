use super::{encode_list, json_list, placeholders, MAX_BATCH};
use crate::database::models::UserRecord;
use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "id, username, email, avatar, bio, links, uploads, followers, following, total_likes, created_at";

pub(super) struct SqliteUserRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        avatar: row.get(3)?,
        bio: row.get(4)?,
        links: json_list(row, 5)?,
        uploads: row.get(6)?,
        followers: row.get(7)?,
        following: row.get(8)?,
        total_likes: row.get(9)?,
        created_at: row.get(10)?,
    })
}

impl<'conn> super::UserRepository for SqliteUserRepository<'conn> {
    fn create(&self, record: &UserRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (id, username, email, avatar, bio, links, uploads, followers, following, total_likes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.id,
                record.username,
                record.email,
                record.avatar,
                record.bio,
                encode_list(&record.links)?,
                record.uploads,
                record.followers,
                record.following,
                record.total_likes,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id], map_user)
            .optional()?;
        Ok(row)
    }

    fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        let row = self
            .conn
            .query_row(&sql, params![email], map_user)
            .optional()?;
        Ok(row)
    }

    fn get_many(&self, ids: &[String]) -> Result<Vec<UserRecord>> {
        let mut users = Vec::new();
        for chunk in ids.chunks(MAX_BATCH) {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id IN ({})",
                placeholders(chunk.len())
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), map_user)?;
            for row in rows {
                users.push(row?);
            }
        }
        Ok(users)
    }

    fn list(&self) -> Result<Vec<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_user)?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    fn update_profile(&self, record: &UserRecord) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE users
            SET avatar = ?2, bio = ?3, links = ?4
            WHERE id = ?1
            "#,
            params![
                record.id,
                record.avatar,
                record.bio,
                encode_list(&record.links)?
            ],
        )?;
        Ok(())
    }

    fn increment_uploads(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET uploads = uploads + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    fn increment_followers(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET followers = followers + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    fn increment_following(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET following = following + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }
}
