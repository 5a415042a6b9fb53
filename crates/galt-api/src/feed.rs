use axum::{
    Json,
    extract::{Query, State},
};

use galt_db::Database;
use galt_types::api::{FeedResponse, PageQuery};
use galt_types::models::Identity;

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::middleware::{AuthUser, Caller};
use crate::shape::shape_statuses;

pub const DEFAULT_PAGE_SIZE: u32 = 30;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A limit/offset window. The cursor for the following page is
/// `offset + limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: u32, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            offset: offset.max(0),
        }
    }

    pub fn next_offset(&self) -> i64 {
        self.offset + i64::from(self.limit)
    }
}

impl From<&PageQuery> for Page {
    fn from(query: &PageQuery) -> Self {
        Self::new(
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.offset.unwrap_or(0),
        )
    }
}

/// Statuses from members of the requester's circles, newest first, rendered
/// for the requester.
pub fn build_feed(db: &Database, requester: &Identity, page: Page) -> galt_db::Result<FeedResponse> {
    let rows = db.feed(&requester.id.to_string(), page.limit, page.offset)?;
    let statuses = shape_statuses(db, &rows, &Caller::User(requester.clone()))?;

    Ok(FeedResponse {
        statuses,
        offset: page.next_offset(),
    })
}

pub async fn get_feed(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let page = Page::from(&query);
    let feed = blocking(&state, move |db| Ok(build_feed(db, &me, page)?)).await?;
    Ok(Json(feed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;
    use galt_db::Relation;
    use galt_db::models::{CircleRow, StatusRow, now_timestamp};
    use galt_types::api::StatusView;
    use uuid::Uuid;

    #[test]
    fn page_is_clamped() {
        assert_eq!(Page::new(0, -5), Page { limit: 1, offset: 0 });
        assert_eq!(Page::new(500, 10).limit, MAX_PAGE_SIZE);
        assert_eq!(Page::new(30, 60).next_offset(), 90);
    }

    fn page_for(uri: &str) -> Page {
        let uri: Uri = uri.parse().unwrap();
        let Query(query) = Query::<PageQuery>::try_from_uri(&uri).unwrap();
        Page::from(&query)
    }

    #[test]
    fn default_page_matches_query_defaults() {
        assert_eq!(Page::from(&PageQuery::default()), Page::new(DEFAULT_PAGE_SIZE, 0));
        assert_eq!(page_for("/feed"), Page::new(DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn unparseable_paging_falls_back_to_defaults() {
        assert_eq!(page_for("/feed?offset=abc"), Page::new(DEFAULT_PAGE_SIZE, 0));
        assert_eq!(page_for("/feed?offset=&limit=lots"), Page::new(DEFAULT_PAGE_SIZE, 0));
        assert_eq!(page_for("/feed?offset=60&limit=10"), Page::new(10, 60));
    }

    #[test]
    fn feed_is_shaped_for_the_requester() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4().to_string();
        let member = Uuid::new_v4().to_string();
        let (circle, status) = (Uuid::new_v4().to_string(), Uuid::new_v4().to_string());
        db.insert_identity(&owner, "owner", "hash").unwrap();
        db.insert_identity(&member, "member", "hash").unwrap();
        db.insert_circle(&CircleRow {
            id: circle.clone(),
            owner_id: owner.clone(),
            name: "c".into(),
            description: String::new(),
        })
        .unwrap();
        db.relation(Relation::CircleMember).add(&member, &circle).unwrap();
        db.insert_status(&StatusRow {
            id: status.clone(),
            author_id: member.clone(),
            content: "hi".into(),
            posted_at: now_timestamp(),
            edited: false,
        })
        .unwrap();
        db.relation(Relation::StatusLike).add(&owner, &status).unwrap();

        let requester = db.find_identity_by_id(&owner).unwrap().identity().unwrap();
        let feed = build_feed(&db, &requester, Page::new(30, 0)).unwrap();

        assert_eq!(feed.offset, 30);
        assert_eq!(feed.statuses.len(), 1);
        match &feed.statuses[0] {
            StatusView::Authed { status, is_liked } => {
                assert!(*is_liked);
                assert_eq!(status.author.username, "member");
            }
            StatusView::Anonymous { .. } => panic!("feed is always rendered for the requester"),
        }
    }
}
