use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::is_unique_violation;
use crate::models::UserRow;
use crate::{Database, DbError, Result};

const USER_COLUMNS: &str = "id, username, password, description, profile_image_ref, created_at";

impl Database {
    /// Registers a new identity. The username check runs in the same
    /// transaction as the insert; a concurrent registration that slips past
    /// it still lands on the UNIQUE index and is reported the same way.
    pub fn insert_identity(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_user(&tx, "username", username)?.is_some() {
                return Err(DbError::DuplicateUsername);
            }

            tx.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::DuplicateUsername
                } else {
                    e.into()
                }
            })?;

            tx.commit()?;
            Ok(())
        })
    }

    pub fn find_identity_by_id(&self, id: &str) -> Result<UserRow> {
        self.with_conn(|conn| query_user(conn, "id", id)?.ok_or(DbError::NotFound("user")))
    }

    pub fn find_identity_by_username(&self, username: &str) -> Result<UserRow> {
        self.with_conn(|conn| {
            query_user(conn, "username", username)?.ok_or(DbError::NotFound("user"))
        })
    }

    /// Writes back the mutable profile fields and password hash.
    pub fn update_identity(&self, user: &UserRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?2, description = ?3, profile_image_ref = ?4 WHERE id = ?1",
                (&user.id, &user.password, &user.description, &user.profile_image_ref),
            )?;
            if changed == 0 {
                return Err(DbError::NotFound("user"));
            }
            Ok(())
        })
    }

    /// Hard delete. Statuses, comments, circles and relation rows owned by the
    /// user go with it through `ON DELETE CASCADE`.
    pub fn delete_identity(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(DbError::NotFound("user"));
            }
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        description: row.get(3)?,
        profile_image_ref: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_username_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.insert_identity("u1", "alice", "hash").unwrap();

        let err = db.insert_identity("u2", "alice", "hash").unwrap_err();
        assert!(matches!(err, DbError::DuplicateUsername));
        assert!(matches!(
            db.find_identity_by_id("u2").unwrap_err(),
            DbError::NotFound(_)
        ));
    }

    #[test]
    fn profile_update_round_trips() {
        let db = Database::open_in_memory().unwrap();
        db.insert_identity("u1", "alice", "hash").unwrap();

        let mut user = db.find_identity_by_username("alice").unwrap();
        assert_eq!(user.description, "");
        user.description = "hello there".into();
        user.profile_image_ref = "img/alice.png".into();
        db.update_identity(&user).unwrap();

        let user = db.find_identity_by_id("u1").unwrap();
        assert_eq!(user.description, "hello there");
        assert_eq!(user.profile_image_ref, "img/alice.png");
    }

    #[test]
    fn delete_missing_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.delete_identity("ghost").unwrap_err(),
            DbError::NotFound(_)
        ));
    }
}
