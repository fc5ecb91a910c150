use super::{placeholders, MAX_BATCH};
use crate::database::models::LikeRecord;
use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;

pub(super) struct SqliteLikeRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::LikeRepository for SqliteLikeRepository<'conn> {
    fn add(&self, record: &LikeRecord) -> Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT INTO content_likes (content_id, user_id, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(content_id, user_id) DO NOTHING
            "#,
            params![record.content_id, record.user_id, record.created_at],
        )?;
        Ok(inserted == 1)
    }

    fn likers_of(&self, content_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT user_id
            FROM content_likes
            WHERE content_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )?;
        let rows = stmt.query_map(params![content_id], |row| row.get::<_, String>(0))?;

        let mut likers = Vec::new();
        for row in rows {
            likers.push(row?);
        }
        Ok(likers)
    }

    fn likers_for(&self, content_ids: &[String]) -> Result<HashMap<String, Vec<String>>> {
        let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
        for chunk in content_ids.chunks(MAX_BATCH) {
            let sql = format!(
                r#"
                SELECT content_id, user_id
                FROM content_likes
                WHERE content_id IN ({})
                ORDER BY created_at ASC, rowid ASC
                "#,
                placeholders(chunk.len())
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            for row in rows {
                let (content_id, user_id) = row?;
                grouped.entry(content_id).or_default().push(user_id);
            }
        }
        Ok(grouped)
    }
}
