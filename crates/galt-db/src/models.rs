//! Database row types. These map directly to SQLite rows and stay distinct
//! from the galt-types models so the storage layer owns its own encoding.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use galt_types::models::{Circle, Comment, Identity, Status};

use crate::{DbError, Result};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub description: String,
    pub profile_image_ref: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct StatusRow {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub posted_at: String,
    pub edited: bool,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub author_id: String,
    pub status_id: String,
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub posted_at: String,
    pub edited: bool,
}

#[derive(Debug, Clone)]
pub struct CircleRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
}

/// Fixed-width RFC 3339 so that lexical order in SQL equals time order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}

/// Ids are the ownership key, so an unreadable one fails the read.
fn parse_id(raw: &str, field: &'static str, row_id: &str) -> Result<Uuid> {
    raw.parse::<Uuid>().map_err(|e| {
        warn!("Corrupt {} '{}' on row '{}': {}", field, raw, row_id, e);
        DbError::Corrupt {
            field,
            row: row_id.to_string(),
        }
    })
}

fn parse_timestamp(raw: &str, row_id: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone; read it as naive UTC.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}

impl UserRow {
    pub fn identity(&self) -> Result<Identity> {
        Ok(Identity {
            id: parse_id(&self.id, "id", &self.id)?,
            username: self.username.clone(),
            description: self.description.clone(),
            profile_image_ref: self.profile_image_ref.clone(),
        })
    }
}

impl TryFrom<&StatusRow> for Status {
    type Error = DbError;

    fn try_from(row: &StatusRow) -> Result<Self> {
        Ok(Self {
            id: parse_id(&row.id, "id", &row.id)?,
            author_id: parse_id(&row.author_id, "author_id", &row.id)?,
            content: row.content.clone(),
            posted_at: parse_timestamp(&row.posted_at, &row.id),
            edited: row.edited,
        })
    }
}

impl TryFrom<&CommentRow> for Comment {
    type Error = DbError;

    fn try_from(row: &CommentRow) -> Result<Self> {
        Ok(Self {
            id: parse_id(&row.id, "id", &row.id)?,
            author_id: parse_id(&row.author_id, "author_id", &row.id)?,
            status_id: parse_id(&row.status_id, "status_id", &row.id)?,
            parent_comment_id: row
                .parent_comment_id
                .as_deref()
                .map(|p| parse_id(p, "parent_comment_id", &row.id))
                .transpose()?,
            content: row.content.clone(),
            posted_at: parse_timestamp(&row.posted_at, &row.id),
            edited: row.edited,
        })
    }
}

impl TryFrom<&CircleRow> for Circle {
    type Error = DbError;

    fn try_from(row: &CircleRow) -> Result<Self> {
        Ok(Self {
            id: parse_id(&row.id, "id", &row.id)?,
            owner_id: parse_id(&row.owner_id, "owner_id", &row.id)?,
            name: row.name.clone(),
            description: row.description.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_sort_lexically() {
        let early = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let late = early + chrono::Duration::microseconds(1);
        assert!(timestamp(early) < timestamp(late));
        assert_eq!(timestamp(early).len(), timestamp(late).len());
    }

    #[test]
    fn corrupt_ids_fail_the_conversion() {
        let row = CircleRow {
            id: Uuid::new_v4().to_string(),
            owner_id: "not-a-uuid".into(),
            name: "friends".into(),
            description: String::new(),
        };
        assert!(matches!(
            Circle::try_from(&row),
            Err(DbError::Corrupt { field: "owner_id", .. })
        ));

        let owner = Uuid::new_v4();
        let row = CircleRow {
            owner_id: owner.to_string(),
            ..row
        };
        assert_eq!(Circle::try_from(&row).unwrap().owner_id, owner);
    }

    #[test]
    fn sqlite_default_timestamps_parse() {
        let t = parse_timestamp("2024-05-06 07:08:09", "row");
        assert_eq!(timestamp(t), "2024-05-06T07:08:09.000000Z");
    }
}
