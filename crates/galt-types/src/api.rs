use chrono::{DateTime, Utc};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::Identity;

// -- Token claims --

/// Bearer token claims. `nbf` mirrors `iat` so a token is only accepted
/// inside `[iat, exp)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

// -- Accounts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

/// Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub description: Option<String>,
    pub profile_image_ref: Option<String>,
    pub password: Option<String>,
}

/// The public face of an account, embedded in every status and comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub description: String,
    pub profile_image_ref: String,
}

impl From<&Identity> for UserProfile {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username.clone(),
            description: identity.description.clone(),
            profile_image_ref: identity.profile_image_ref.clone(),
        }
    }
}

// -- Statuses & comments --

/// Body for posting or editing a status, comment or reply.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusBody {
    pub id: Uuid,
    pub author: UserProfile,
    pub content: String,
    pub likes: u64,
    pub posted_at: DateTime<Utc>,
    pub edited: bool,
}

/// A status as rendered for a particular caller. Only the authenticated
/// variant carries `is_liked`; the anonymous one has no such key at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum StatusView {
    Authed {
        #[serde(flatten)]
        status: StatusBody,
        is_liked: bool,
    },
    Anonymous {
        #[serde(flatten)]
        status: StatusBody,
    },
}

impl StatusView {
    pub fn body(&self) -> &StatusBody {
        match self {
            Self::Authed { status, .. } | Self::Anonymous { status } => status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentBody {
    pub id: Uuid,
    pub status_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub author: UserProfile,
    pub content: String,
    pub likes: u64,
    pub posted_at: DateTime<Utc>,
    pub edited: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum CommentView {
    Authed {
        #[serde(flatten)]
        comment: CommentBody,
        is_liked: bool,
    },
    Anonymous {
        #[serde(flatten)]
        comment: CommentBody,
    },
}

impl CommentView {
    pub fn body(&self) -> &CommentBody {
        match self {
            Self::Authed { comment, .. } | Self::Anonymous { comment } => comment,
        }
    }
}

/// A comment together with its replies, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThread {
    pub comment: CommentView,
    pub replies: Vec<CommentThread>,
}

/// Paging parameters. Values that do not parse are treated as absent, so
/// `?offset=abc` reads the first page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default, deserialize_with = "lenient")]
    pub offset: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub limit: Option<u32>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.trim().parse().ok()))
}

/// `offset` is the cursor for the next page.
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    pub statuses: Vec<StatusView>,
    pub offset: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentsResponse {
    pub comments: Vec<CommentView>,
    pub offset: i64,
}

// -- Circles --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCircleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Empty or absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCircleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub member_count: u64,
}
