//! Renders statuses and comments for a particular caller.
//!
//! Signed-in callers get the `Authed` variant with `is_liked`; anonymous
//! callers get the `Anonymous` variant, which has no such field at all.

use std::collections::HashMap;

use galt_db::models::{CommentRow, StatusRow};
use galt_db::{Database, Relation, Result};
use galt_types::api::{CommentBody, CommentThread, CommentView, StatusBody, StatusView, UserProfile};
use galt_types::models::{Comment, Identity, Status};

use crate::middleware::Caller;

/// How deep a comment thread is expanded below its root.
pub const THREAD_DEPTH: usize = 3;
const REPLIES_PER_LEVEL: u32 = 30;

pub fn shape_status(
    db: &Database,
    status: &StatusRow,
    author: &Identity,
    caller: &Caller,
) -> Result<StatusView> {
    let ledger = db.relation(Relation::StatusLike);
    let model = Status::try_from(status)?;

    let body = StatusBody {
        id: model.id,
        author: UserProfile::from(author),
        content: model.content,
        likes: ledger.count(&status.id)?,
        posted_at: model.posted_at,
        edited: model.edited,
    };

    Ok(match caller.identity() {
        Some(me) => StatusView::Authed {
            is_liked: ledger.exists(&me.id.to_string(), &status.id)?,
            status: body,
        },
        None => StatusView::Anonymous { status: body },
    })
}

pub fn shape_comment(
    db: &Database,
    comment: &CommentRow,
    author: &Identity,
    caller: &Caller,
) -> Result<CommentView> {
    let ledger = db.relation(Relation::CommentLike);
    let model = Comment::try_from(comment)?;

    let body = CommentBody {
        id: model.id,
        status_id: model.status_id,
        parent_comment_id: model.parent_comment_id,
        author: UserProfile::from(author),
        content: model.content,
        likes: ledger.count(&comment.id)?,
        posted_at: model.posted_at,
        edited: model.edited,
    };

    Ok(match caller.identity() {
        Some(me) => CommentView::Authed {
            is_liked: ledger.exists(&me.id.to_string(), &comment.id)?,
            comment: body,
        },
        None => CommentView::Anonymous { comment: body },
    })
}

/// Author lookups for a batch of rows; each author is read once.
#[derive(Default)]
pub struct Authors {
    seen: HashMap<String, Identity>,
}

impl Authors {
    pub fn get(&mut self, db: &Database, id: &str) -> Result<Identity> {
        if let Some(identity) = self.seen.get(id) {
            return Ok(identity.clone());
        }
        let identity = db.find_identity_by_id(id)?.identity()?;
        self.seen.insert(id.to_string(), identity.clone());
        Ok(identity)
    }
}

pub fn shape_statuses(db: &Database, rows: &[StatusRow], caller: &Caller) -> Result<Vec<StatusView>> {
    let mut authors = Authors::default();
    rows.iter()
        .map(|row| {
            let author = authors.get(db, &row.author_id)?;
            shape_status(db, row, &author, caller)
        })
        .collect()
}

pub fn shape_comments(
    db: &Database,
    rows: &[CommentRow],
    caller: &Caller,
) -> Result<Vec<CommentView>> {
    let mut authors = Authors::default();
    rows.iter()
        .map(|row| {
            let author = authors.get(db, &row.author_id)?;
            shape_comment(db, row, &author, caller)
        })
        .collect()
}

/// `root` plus up to `depth` levels of replies.
pub fn shape_thread(
    db: &Database,
    root: &CommentRow,
    caller: &Caller,
    depth: usize,
) -> Result<CommentThread> {
    let mut authors = Authors::default();
    thread(db, root, caller, depth, &mut authors)
}

fn thread(
    db: &Database,
    root: &CommentRow,
    caller: &Caller,
    depth: usize,
    authors: &mut Authors,
) -> Result<CommentThread> {
    let author = authors.get(db, &root.author_id)?;
    let comment = shape_comment(db, root, &author, caller)?;

    let replies = if depth == 0 {
        Vec::new()
    } else {
        db.replies_to(&root.id, REPLIES_PER_LEVEL)?
            .iter()
            .map(|reply| thread(db, reply, caller, depth - 1, authors))
            .collect::<Result<Vec<_>>>()?
    };

    Ok(CommentThread { comment, replies })
}

#[cfg(test)]
mod tests {
    use super::*;
    use galt_db::models::now_timestamp;
    use uuid::Uuid;

    struct Fixture {
        db: Database,
        alice: Identity,
        bob: Identity,
        status: StatusRow,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let (alice_id, bob_id) = (Uuid::new_v4().to_string(), Uuid::new_v4().to_string());
        db.insert_identity(&alice_id, "alice", "hash").unwrap();
        db.insert_identity(&bob_id, "bob", "hash").unwrap();
        let status = StatusRow {
            id: Uuid::new_v4().to_string(),
            author_id: alice_id.clone(),
            content: "hello".into(),
            posted_at: now_timestamp(),
            edited: false,
        };
        db.insert_status(&status).unwrap();

        let alice = db.find_identity_by_id(&alice_id).unwrap().identity().unwrap();
        let bob = db.find_identity_by_id(&bob_id).unwrap().identity().unwrap();
        Fixture { db, alice, bob, status }
    }

    #[test]
    fn anonymous_view_has_no_liked_field() {
        let f = fixture();
        let view = shape_status(&f.db, &f.status, &f.alice, &Caller::Anonymous).unwrap();

        assert!(matches!(view, StatusView::Anonymous { .. }));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["view"], "anonymous");
        assert!(json.get("is_liked").is_none());
        assert!(json.get("reshares").is_none());
        assert_eq!(json["content"], "hello");
        assert_eq!(json["author"]["username"], "alice");
    }

    #[test]
    fn authed_view_tracks_the_ledger() {
        let f = fixture();
        let caller = Caller::User(f.bob.clone());

        let view = shape_status(&f.db, &f.status, &f.alice, &caller).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["view"], "authed");
        assert_eq!(json["is_liked"], false);
        assert_eq!(json["likes"], 0);

        f.db.relation(Relation::StatusLike)
            .add(&f.bob.id.to_string(), &f.status.id)
            .unwrap();

        let view = shape_status(&f.db, &f.status, &f.alice, &caller).unwrap();
        match view {
            StatusView::Authed { is_liked, status } => {
                assert!(is_liked);
                assert_eq!(status.likes, 1);
            }
            StatusView::Anonymous { .. } => panic!("expected authed view"),
        }

        // Someone else's like shows in the count but not in is_liked.
        let view = shape_status(&f.db, &f.status, &f.alice, &Caller::User(f.alice.clone())).unwrap();
        assert!(matches!(view, StatusView::Authed { is_liked: false, .. }));
        assert_eq!(view.body().likes, 1);
    }

    #[test]
    fn comment_views_follow_the_same_duality() {
        let f = fixture();
        let row = CommentRow {
            id: Uuid::new_v4().to_string(),
            author_id: f.bob.id.to_string(),
            status_id: f.status.id.clone(),
            parent_comment_id: None,
            content: "nice".into(),
            posted_at: now_timestamp(),
            edited: false,
        };
        f.db.insert_comment(&row).unwrap();
        f.db.relation(Relation::CommentLike)
            .add(&f.alice.id.to_string(), &row.id)
            .unwrap();

        let anon = serde_json::to_value(
            shape_comment(&f.db, &row, &f.bob, &Caller::Anonymous).unwrap(),
        )
        .unwrap();
        assert!(anon.get("is_liked").is_none());
        assert_eq!(anon["likes"], 1);

        let authed = shape_comment(&f.db, &row, &f.bob, &Caller::User(f.alice.clone())).unwrap();
        assert!(matches!(authed, CommentView::Authed { is_liked: true, .. }));
    }

    #[test]
    fn threads_stop_at_the_requested_depth() {
        let f = fixture();
        let mut parent: Option<String> = None;
        let mut rows = Vec::new();
        for n in 0..5 {
            let row = CommentRow {
                id: Uuid::new_v4().to_string(),
                author_id: f.alice.id.to_string(),
                status_id: f.status.id.clone(),
                parent_comment_id: parent.clone(),
                content: format!("level {n}"),
                posted_at: now_timestamp(),
                edited: false,
            };
            f.db.insert_comment(&row).unwrap();
            parent = Some(row.id.clone());
            rows.push(row);
        }

        let thread = shape_thread(&f.db, &rows[0], &Caller::Anonymous, 2).unwrap();
        let child = &thread.replies[0];
        let grandchild = &child.replies[0];
        assert_eq!(grandchild.comment.body().content, "level 2");
        assert!(grandchild.replies.is_empty());
    }
}
