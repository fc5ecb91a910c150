use crate::database::models::PostRecord;
use anyhow::Result;
use rusqlite::{params, Connection, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        text: row.get(1)?,
        author_id: row.get(2)?,
        created_at: row.get(3)?,
        likes: row.get(4)?,
    })
}

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO posts (id, text, author_id, created_at, likes)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.id,
                record.text,
                record.author_id,
                record.created_at,
                record.likes
            ],
        )?;
        Ok(())
    }

    fn list_recent(&self) -> Result<Vec<PostRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, text, author_id, created_at, likes
            FROM posts
            ORDER BY created_at DESC
            "#,
        )?;
        let rows = stmt.query_map([], map_post)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }
}
