//! Idempotent `(actor, target)` relation sets.
//!
//! Status likes, comment likes and circle membership share one contract:
//! adding an existing pair and removing an absent pair both succeed without
//! changing anything, so a retried or duplicated request never skews counts.

use rusqlite::Connection;
use tracing::debug;

use crate::error::is_unique_violation;
use crate::{Database, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// user likes status
    StatusLike,
    /// user likes comment
    CommentLike,
    /// user is a member of circle
    CircleMember,
}

impl Relation {
    fn table(self) -> &'static str {
        match self {
            Self::StatusLike => "status_likes",
            Self::CommentLike => "comment_likes",
            Self::CircleMember => "circle_members",
        }
    }

    fn target_column(self) -> &'static str {
        match self {
            Self::StatusLike => "status_id",
            Self::CommentLike => "comment_id",
            Self::CircleMember => "circle_id",
        }
    }
}

/// A view of one relation table. Obtain with [`Database::relation`].
pub struct Ledger<'a> {
    db: &'a Database,
    relation: Relation,
}

impl Database {
    pub fn relation(&self, relation: Relation) -> Ledger<'_> {
        Ledger { db: self, relation }
    }
}

impl Ledger<'_> {
    pub fn exists(&self, actor: &str, target: &str) -> Result<bool> {
        self.db.with_conn(|conn| pair_exists(conn, self.relation, actor, target))
    }

    /// Inserts the pair unless present. Returns whether a row was written.
    ///
    /// The existence check and insert share a transaction. If another writer
    /// still beats us to it, the primary key rejects the second row and that
    /// rejection is treated as the already-present case.
    pub fn add(&self, actor: &str, target: &str) -> Result<bool> {
        let relation = self.relation;
        self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if pair_exists(&tx, relation, actor, target)? {
                return Ok(false);
            }

            let sql = format!(
                "INSERT INTO {} (user_id, {}) VALUES (?1, ?2)",
                relation.table(),
                relation.target_column()
            );
            let inserted = match tx.execute(&sql, (actor, target)) {
                Ok(n) => n > 0,
                Err(e) if is_unique_violation(&e) => {
                    debug!("{:?} ({}, {}) already present", relation, actor, target);
                    false
                }
                Err(e) => return Err(e.into()),
            };

            tx.commit()?;
            Ok(inserted)
        })
    }

    /// Deletes the pair. Returns whether a row was removed.
    pub fn remove(&self, actor: &str, target: &str) -> Result<bool> {
        let relation = self.relation;
        self.db.with_conn_mut(|conn| {
            let sql = format!(
                "DELETE FROM {} WHERE user_id = ?1 AND {} = ?2",
                relation.table(),
                relation.target_column()
            );
            let removed = conn.execute(&sql, (actor, target))?;
            Ok(removed > 0)
        })
    }

    /// Number of distinct actors related to `target`.
    pub fn count(&self, target: &str) -> Result<u64> {
        let relation = self.relation;
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT COUNT(DISTINCT user_id) FROM {} WHERE {} = ?1",
                relation.table(),
                relation.target_column()
            );
            let count: i64 = conn.query_row(&sql, [target], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    /// Actors related to `target`, in insertion order.
    pub fn actors(&self, target: &str) -> Result<Vec<String>> {
        let relation = self.relation;
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT user_id FROM {} WHERE {} = ?1 ORDER BY rowid",
                relation.table(),
                relation.target_column()
            );
            let mut stmt = conn.prepare(&sql)?;
            let actors = stmt
                .query_map([target], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(actors)
        })
    }
}

fn pair_exists(conn: &Connection, relation: Relation, actor: &str, target: &str) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = ?1 AND {} = ?2)",
        relation.table(),
        relation.target_column()
    );
    let exists: bool = conn.query_row(&sql, (actor, target), |row| row.get(0))?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CircleRow, CommentRow, StatusRow, now_timestamp};

    fn seed() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.insert_identity("alice", "alice", "hash").unwrap();
        db.insert_identity("bob", "bob", "hash").unwrap();
        db.insert_status(&StatusRow {
            id: "s1".into(),
            author_id: "alice".into(),
            content: "hello".into(),
            posted_at: now_timestamp(),
            edited: false,
        })
        .unwrap();
        db.insert_comment(&CommentRow {
            id: "c1".into(),
            author_id: "bob".into(),
            status_id: "s1".into(),
            parent_comment_id: None,
            content: "hi".into(),
            posted_at: now_timestamp(),
            edited: false,
        })
        .unwrap();
        db.insert_circle(&CircleRow {
            id: "k1".into(),
            owner_id: "alice".into(),
            name: "friends".into(),
            description: String::new(),
        })
        .unwrap();
        db
    }

    const CASES: [(Relation, &str); 3] = [
        (Relation::StatusLike, "s1"),
        (Relation::CommentLike, "c1"),
        (Relation::CircleMember, "k1"),
    ];

    #[test]
    fn add_twice_counts_once() {
        let db = seed();
        for (relation, target) in CASES {
            let ledger = db.relation(relation);
            assert!(ledger.add("bob", target).unwrap());
            assert!(!ledger.add("bob", target).unwrap());
            assert_eq!(ledger.count(target).unwrap(), 1, "{relation:?}");
            assert!(ledger.exists("bob", target).unwrap());
        }
    }

    #[test]
    fn remove_absent_pair_is_a_no_op() {
        let db = seed();
        for (relation, target) in CASES {
            let ledger = db.relation(relation);
            ledger.add("alice", target).unwrap();

            assert!(!ledger.remove("bob", target).unwrap());
            assert_eq!(ledger.count(target).unwrap(), 1, "{relation:?}");

            assert!(ledger.remove("alice", target).unwrap());
            assert!(!ledger.remove("alice", target).unwrap());
            assert_eq!(ledger.count(target).unwrap(), 0);
        }
    }

    #[test]
    fn relations_are_independent() {
        let db = seed();
        db.relation(Relation::StatusLike).add("bob", "s1").unwrap();

        assert!(!db.relation(Relation::CommentLike).exists("bob", "s1").unwrap());
        assert_eq!(db.relation(Relation::CircleMember).count("s1").unwrap(), 0);
    }

    #[test]
    fn actors_lists_members() {
        let db = seed();
        let members = db.relation(Relation::CircleMember);
        members.add("bob", "k1").unwrap();
        members.add("alice", "k1").unwrap();
        members.add("bob", "k1").unwrap();

        assert_eq!(members.actors("k1").unwrap(), vec!["bob", "alice"]);
    }

    #[test]
    fn unknown_target_is_a_store_error_not_a_silent_success() {
        let db = seed();
        let err = db.relation(Relation::StatusLike).add("bob", "missing");
        assert!(matches!(err, Err(crate::DbError::Store(_))));
    }
}
