use rusqlite::{OptionalExtension, Row};

use crate::models::StatusRow;
use crate::{Database, DbError, Result};

pub(crate) const STATUS_COLUMNS: &str = "s.id, s.author_id, s.content, s.posted_at, s.edited";

impl Database {
    pub fn insert_status(&self, status: &StatusRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO statuses (id, author_id, content, posted_at, edited) VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    &status.id,
                    &status.author_id,
                    &status.content,
                    &status.posted_at,
                    status.edited,
                ),
            )?;
            Ok(())
        })
    }

    pub fn find_status(&self, id: &str) -> Result<StatusRow> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {STATUS_COLUMNS} FROM statuses s WHERE s.id = ?1");
            conn.query_row(&sql, [id], status_from_row)
                .optional()?
                .ok_or(DbError::NotFound("status"))
        })
    }

    pub fn update_status(&self, status: &StatusRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE statuses SET content = ?2, posted_at = ?3, edited = ?4 WHERE id = ?1",
                (&status.id, &status.content, &status.posted_at, status.edited),
            )?;
            if changed == 0 {
                return Err(DbError::NotFound("status"));
            }
            Ok(())
        })
    }

    pub fn delete_status(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM statuses WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(DbError::NotFound("status"));
            }
            Ok(())
        })
    }
}

pub(crate) fn status_from_row(row: &Row<'_>) -> rusqlite::Result<StatusRow> {
    Ok(StatusRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        content: row.get(2)?,
        posted_at: row.get(3)?,
        edited: row.get(4)?,
    })
}
