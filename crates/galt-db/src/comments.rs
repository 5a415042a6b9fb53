use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::CommentRow;
use crate::{Database, DbError, Result};

const COMMENT_COLUMNS: &str =
    "id, author_id, status_id, parent_comment_id, content, posted_at, edited";

impl Database {
    pub fn insert_comment(&self, comment: &CommentRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (id, author_id, status_id, parent_comment_id, content, posted_at, edited)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                (
                    &comment.id,
                    &comment.author_id,
                    &comment.status_id,
                    &comment.parent_comment_id,
                    &comment.content,
                    &comment.posted_at,
                    comment.edited,
                ),
            )?;
            Ok(())
        })
    }

    pub fn find_comment(&self, id: &str) -> Result<CommentRow> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1");
            conn.query_row(&sql, [id], comment_from_row)
                .optional()?
                .ok_or(DbError::NotFound("comment"))
        })
    }

    pub fn update_comment(&self, comment: &CommentRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE comments SET content = ?2, posted_at = ?3, edited = ?4 WHERE id = ?1",
                (&comment.id, &comment.content, &comment.posted_at, comment.edited),
            )?;
            if changed == 0 {
                return Err(DbError::NotFound("comment"));
            }
            Ok(())
        })
    }

    pub fn delete_comment(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(DbError::NotFound("comment"));
            }
            Ok(())
        })
    }

    /// Top-level comments on a status, newest first. Replies hang off their
    /// parent and are fetched with [`replies_to`](Self::replies_to).
    pub fn comments_for_status(
        &self,
        status_id: &str,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            query_comments(
                conn,
                "status_id = ?1 AND parent_comment_id IS NULL",
                status_id,
                limit,
                offset,
            )
        })
    }

    pub fn replies_to(&self, comment_id: &str, limit: u32) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_comments(conn, "parent_comment_id = ?1", comment_id, limit, 0))
    }
}

fn query_comments(
    conn: &Connection,
    filter: &str,
    key: &str,
    limit: u32,
    offset: i64,
) -> Result<Vec<CommentRow>> {
    let sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments
         WHERE {filter}
         ORDER BY posted_at DESC, rowid DESC
         LIMIT ?2 OFFSET ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params![key, limit, offset], comment_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        status_id: row.get(2)?,
        parent_comment_id: row.get(3)?,
        content: row.get(4)?,
        posted_at: row.get(5)?,
        edited: row.get(6)?,
    })
}
