use super::{encode_list, json_list};
use crate::database::models::ContentRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

const CONTENT_COLUMNS: &str = "id, title, description, tags, price, content_type, author_id, likes, downloads, created_at, thumbnail, screenshots, file_paths";

pub(super) struct SqliteContentRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_content(row: &Row<'_>) -> rusqlite::Result<ContentRecord> {
    Ok(ContentRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        tags: json_list(row, 3)?,
        price: row.get(4)?,
        content_type: row.get(5)?,
        author_id: row.get(6)?,
        likes: row.get(7)?,
        downloads: row.get(8)?,
        created_at: row.get(9)?,
        thumbnail: row.get(10)?,
        screenshots: json_list(row, 11)?,
        file_paths: json_list(row, 12)?,
    })
}

impl<'conn> super::ContentRepository for SqliteContentRepository<'conn> {
    fn create(&self, record: &ContentRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO content (id, title, description, tags, price, content_type, author_id, likes, downloads, created_at, thumbnail, screenshots, file_paths)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                record.id,
                record.title,
                record.description,
                encode_list(&record.tags)?,
                record.price,
                record.content_type,
                record.author_id,
                record.likes,
                record.downloads,
                record.created_at,
                record.thumbnail,
                encode_list(&record.screenshots)?,
                encode_list(&record.file_paths)?,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ContentRecord>> {
        let sql = format!("SELECT {CONTENT_COLUMNS} FROM content WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id], map_content)
            .optional()?;
        Ok(row)
    }

    fn list(&self) -> Result<Vec<ContentRecord>> {
        let sql = format!("SELECT {CONTENT_COLUMNS} FROM content ORDER BY created_at DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_content)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    fn increment_likes(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE content SET likes = likes + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }
}
