use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resolved account. Never carries the password hash; that stays in the
/// store's row type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub description: String,
    pub profile_image_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub posted_at: DateTime<Utc>,
    pub edited: bool,
}

/// A comment on a status. `parent_comment_id` is a back-reference into the
/// reply tree, not an ownership relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub status_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub posted_at: DateTime<Utc>,
    pub edited: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
}
