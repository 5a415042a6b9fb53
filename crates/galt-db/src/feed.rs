use crate::models::StatusRow;
use crate::statuses::{STATUS_COLUMNS, status_from_row};
use crate::{Database, Result};

impl Database {
    /// Statuses visible to `owner_id`: everything authored by a member of any
    /// circle `owner_id` owns. Newest first; insertion order breaks ties.
    ///
    /// Owning a circle does not put the owner in it, so the owner's own posts
    /// only appear if some other circle of theirs lists them, which the API
    /// never allows.
    pub fn feed(&self, owner_id: &str, limit: u32, offset: i64) -> Result<Vec<StatusRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {STATUS_COLUMNS} FROM statuses s
                 WHERE s.author_id IN (
                     SELECT m.user_id FROM circle_members m
                     JOIN circles c ON c.id = m.circle_id
                     WHERE c.owner_id = ?1
                 )
                 ORDER BY s.posted_at DESC, s.rowid DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![owner_id, limit, offset], status_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::Relation;
    use crate::models::{CircleRow, StatusRow, timestamp};

    use super::*;

    fn post(db: &Database, id: &str, author: &str, minutes_ago: i64) {
        db.insert_status(&StatusRow {
            id: id.into(),
            author_id: author.into(),
            content: format!("status {id}"),
            posted_at: timestamp(Utc::now() - Duration::minutes(minutes_ago)),
            edited: false,
        })
        .unwrap();
    }

    fn circle(db: &Database, id: &str, owner: &str) {
        db.insert_circle(&CircleRow {
            id: id.into(),
            owner_id: owner.into(),
            name: id.into(),
            description: String::new(),
        })
        .unwrap();
    }

    fn ids(rows: Vec<StatusRow>) -> Vec<String> {
        rows.into_iter().map(|r| r.id).collect()
    }

    fn seed() -> Database {
        let db = Database::open_in_memory().unwrap();
        for user in ["rita", "mia", "max", "stranger"] {
            db.insert_identity(user, user, "hash").unwrap();
        }
        db
    }

    #[test]
    fn no_circles_means_empty_feed() {
        let db = seed();
        post(&db, "s1", "mia", 1);
        assert!(db.feed("rita", 30, 0).unwrap().is_empty());
    }

    #[test]
    fn member_posts_appear_until_removed() {
        let db = seed();
        circle(&db, "close", "rita");
        db.relation(Relation::CircleMember).add("mia", "close").unwrap();
        post(&db, "s-mia", "mia", 1);
        post(&db, "s-rita", "rita", 0);
        post(&db, "s-stranger", "stranger", 0);

        assert_eq!(ids(db.feed("rita", 30, 0).unwrap()), vec!["s-mia"]);

        db.relation(Relation::CircleMember).remove("mia", "close").unwrap();
        assert!(db.feed("rita", 30, 0).unwrap().is_empty());
    }

    #[test]
    fn membership_in_several_circles_does_not_duplicate() {
        let db = seed();
        circle(&db, "a", "rita");
        circle(&db, "b", "rita");
        let members = db.relation(Relation::CircleMember);
        members.add("mia", "a").unwrap();
        members.add("mia", "b").unwrap();
        post(&db, "s1", "mia", 0);

        assert_eq!(ids(db.feed("rita", 30, 0).unwrap()), vec!["s1"]);
    }

    #[test]
    fn only_the_owners_circles_count() {
        let db = seed();
        circle(&db, "maxs", "max");
        db.relation(Relation::CircleMember).add("mia", "maxs").unwrap();
        post(&db, "s1", "mia", 0);

        assert!(db.feed("rita", 30, 0).unwrap().is_empty());
        assert_eq!(ids(db.feed("max", 30, 0).unwrap()), vec!["s1"]);
    }

    #[test]
    fn newest_first_and_paginated() {
        let db = seed();
        circle(&db, "c", "rita");
        let members = db.relation(Relation::CircleMember);
        members.add("mia", "c").unwrap();
        members.add("max", "c").unwrap();
        post(&db, "old", "mia", 30);
        post(&db, "mid", "max", 20);
        post(&db, "new", "mia", 10);

        assert_eq!(ids(db.feed("rita", 2, 0).unwrap()), vec!["new", "mid"]);
        assert_eq!(ids(db.feed("rita", 2, 2).unwrap()), vec!["old"]);
        assert!(db.feed("rita", 2, 4).unwrap().is_empty());
    }
}
