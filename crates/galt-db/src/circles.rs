use rusqlite::{OptionalExtension, Row};

use crate::models::CircleRow;
use crate::{Database, DbError, Result};

impl Database {
    pub fn insert_circle(&self, circle: &CircleRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO circles (id, owner_id, name, description) VALUES (?1, ?2, ?3, ?4)",
                (&circle.id, &circle.owner_id, &circle.name, &circle.description),
            )?;
            Ok(())
        })
    }

    pub fn find_circle(&self, id: &str) -> Result<CircleRow> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, owner_id, name, description FROM circles WHERE id = ?1",
                [id],
                circle_from_row,
            )
            .optional()?
            .ok_or(DbError::NotFound("circle"))
        })
    }

    pub fn update_circle(&self, circle: &CircleRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE circles SET name = ?2, description = ?3 WHERE id = ?1",
                (&circle.id, &circle.name, &circle.description),
            )?;
            if changed == 0 {
                return Err(DbError::NotFound("circle"));
            }
            Ok(())
        })
    }

    /// Membership rows go with the circle.
    pub fn delete_circle(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM circles WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(DbError::NotFound("circle"));
            }
            Ok(())
        })
    }

    pub fn circles_owned_by(&self, owner_id: &str) -> Result<Vec<CircleRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name, description FROM circles
                 WHERE owner_id = ?1
                 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([owner_id], circle_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn circle_from_row(row: &Row<'_>) -> rusqlite::Result<CircleRow> {
    Ok(CircleRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Relation;

    fn circle(id: &str, owner: &str) -> CircleRow {
        CircleRow {
            id: id.into(),
            owner_id: owner.into(),
            name: format!("circle {id}"),
            description: String::new(),
        }
    }

    #[test]
    fn circles_are_listed_per_owner() {
        let db = Database::open_in_memory().unwrap();
        db.insert_identity("alice", "alice", "hash").unwrap();
        db.insert_identity("bob", "bob", "hash").unwrap();
        db.insert_circle(&circle("k1", "alice")).unwrap();
        db.insert_circle(&circle("k2", "bob")).unwrap();
        db.insert_circle(&circle("k3", "alice")).unwrap();

        let ids: Vec<_> = db
            .circles_owned_by("alice")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, ["k1", "k3"]);
    }

    #[test]
    fn deleting_the_owner_removes_circles_and_memberships() {
        let db = Database::open_in_memory().unwrap();
        db.insert_identity("alice", "alice", "hash").unwrap();
        db.insert_identity("bob", "bob", "hash").unwrap();
        db.insert_circle(&circle("k1", "alice")).unwrap();
        db.relation(Relation::CircleMember).add("bob", "k1").unwrap();

        db.delete_identity("alice").unwrap();

        assert!(matches!(db.find_circle("k1"), Err(DbError::NotFound(_))));
        assert_eq!(db.relation(Relation::CircleMember).count("k1").unwrap(), 0);
    }

    #[test]
    fn updating_a_missing_circle_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.update_circle(&circle("ghost", "nobody")),
            Err(DbError::NotFound(_))
        ));
    }
}
