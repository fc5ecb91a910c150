use super::{placeholders, MAX_BATCH};
use crate::database::models::FollowRecord;
use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::BTreeMap;

pub(super) struct SqliteFollowRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::FollowRepository for SqliteFollowRepository<'conn> {
    fn add(&self, record: &FollowRecord) -> Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT INTO follows (follower_id, followee_id, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(follower_id, followee_id) DO NOTHING
            "#,
            params![record.follower_id, record.followee_id, record.created_at],
        )?;
        Ok(inserted == 1)
    }

    fn edges_touching(&self, user_ids: &[String]) -> Result<Vec<FollowRecord>> {
        // An edge between ids in different chunks comes back twice.
        let mut edges: BTreeMap<i64, FollowRecord> = BTreeMap::new();
        for chunk in user_ids.chunks(MAX_BATCH) {
            let marks = placeholders(chunk.len());
            let sql = format!(
                r#"
                SELECT rowid, follower_id, followee_id, created_at
                FROM follows
                WHERE follower_id IN ({marks}) OR followee_id IN ({marks})
                "#
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let bound = chunk.iter().chain(chunk.iter());
            let rows = stmt.query_map(params_from_iter(bound), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    FollowRecord {
                        follower_id: row.get(1)?,
                        followee_id: row.get(2)?,
                        created_at: row.get(3)?,
                    },
                ))
            })?;
            for row in rows {
                let (rowid, edge) = row?;
                edges.insert(rowid, edge);
            }
        }

        let mut edges: Vec<(i64, FollowRecord)> = edges.into_iter().collect();
        edges.sort_by(|(a_id, a), (b_id, b)| {
            a.created_at.cmp(&b.created_at).then(a_id.cmp(b_id))
        });
        Ok(edges.into_iter().map(|(_, edge)| edge).collect())
    }
}
