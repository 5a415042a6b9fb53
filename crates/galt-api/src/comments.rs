use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use galt_db::models::{CommentRow, now_timestamp};
use galt_db::{Database, Relation};
use galt_types::api::{CommentThread, CommentView, CommentsResponse, ContentRequest, PageQuery};
use galt_types::models::{Comment, Identity};

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::feed::Page;
use crate::guard;
use crate::middleware::{AuthUser, Caller};
use crate::shape::{THREAD_DEPTH, shape_comment, shape_comments, shape_thread};
use crate::statuses::validate_content;

fn owned_comment(db: &Database, id: &str, me: &Identity, action: &'static str) -> Result<CommentRow, ApiError> {
    let row = db.find_comment(id)?;
    if !guard::can_mutate_or_delete(Comment::try_from(&row)?.author_id, Some(me.id)) {
        return Err(ApiError::PermissionDenied(action));
    }
    Ok(row)
}

fn insert_and_render(db: &Database, row: &CommentRow, me: Identity) -> Result<CommentView, ApiError> {
    db.insert_comment(row)?;
    Ok(shape_comment(db, row, &me, &Caller::User(me.clone()))?)
}

/// Top-level comments on a status.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
    caller: Caller,
) -> Result<Json<CommentsResponse>, ApiError> {
    let page = Page::from(&query);
    let comments = blocking(&state, move |db| {
        let status = db.find_status(&status_id.to_string())?;
        let rows = db.comments_for_status(&status.id, page.limit, page.offset)?;
        Ok(shape_comments(db, &rows, &caller)?)
    })
    .await?;

    Ok(Json(CommentsResponse {
        comments,
        offset: page.next_offset(),
    }))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
    AuthUser(me): AuthUser,
    Json(req): Json<ContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_content(&req.content)?;

    let view = blocking(&state, move |db| {
        let status = db.find_status(&status_id.to_string())?;
        let row = CommentRow {
            id: Uuid::new_v4().to_string(),
            author_id: me.id.to_string(),
            status_id: status.id,
            parent_comment_id: None,
            content: req.content,
            posted_at: now_timestamp(),
            edited: false,
        };
        insert_and_render(db, &row, me)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// A reply lands on the same status as the comment it answers.
pub async fn post_reply(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    AuthUser(me): AuthUser,
    Json(req): Json<ContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_content(&req.content)?;

    let view = blocking(&state, move |db| {
        let parent = db.find_comment(&comment_id.to_string())?;
        let row = CommentRow {
            id: Uuid::new_v4().to_string(),
            author_id: me.id.to_string(),
            status_id: parent.status_id,
            parent_comment_id: Some(parent.id),
            content: req.content,
            posted_at: now_timestamp(),
            edited: false,
        };
        insert_and_render(db, &row, me)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_thread(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    caller: Caller,
) -> Result<Json<CommentThread>, ApiError> {
    let thread = blocking(&state, move |db| {
        let root = db.find_comment(&comment_id.to_string())?;
        Ok(shape_thread(db, &root, &caller, THREAD_DEPTH)?)
    })
    .await?;
    Ok(Json(thread))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    AuthUser(me): AuthUser,
    Json(req): Json<ContentRequest>,
) -> Result<Json<CommentView>, ApiError> {
    validate_content(&req.content)?;

    let view = blocking(&state, move |db| {
        let mut row = owned_comment(db, &comment_id.to_string(), &me, "edit this comment")?;
        row.content = req.content;
        row.posted_at = now_timestamp();
        row.edited = true;
        db.update_comment(&row)?;
        Ok(shape_comment(db, &row, &me, &Caller::User(me.clone()))?)
    })
    .await?;

    Ok(Json(view))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    AuthUser(me): AuthUser,
) -> Result<Json<CommentView>, ApiError> {
    let view = blocking(&state, move |db| {
        let row = owned_comment(db, &comment_id.to_string(), &me, "delete this comment")?;
        let view = shape_comment(db, &row, &me, &Caller::User(me.clone()))?;
        db.delete_comment(&row.id)?;
        Ok(view)
    })
    .await?;

    Ok(Json(view))
}

pub async fn like_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    AuthUser(me): AuthUser,
) -> Result<Json<CommentView>, ApiError> {
    set_like(&state, comment_id, me, true).await.map(Json)
}

pub async fn unlike_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    AuthUser(me): AuthUser,
) -> Result<Json<CommentView>, ApiError> {
    set_like(&state, comment_id, me, false).await.map(Json)
}

async fn set_like(
    state: &AppState,
    comment_id: Uuid,
    me: Identity,
    liked: bool,
) -> Result<CommentView, ApiError> {
    blocking(state, move |db| {
        let row = db.find_comment(&comment_id.to_string())?;
        let ledger = db.relation(Relation::CommentLike);
        let me_id = me.id.to_string();
        if liked {
            ledger.add(&me_id, &row.id)?;
        } else {
            ledger.remove(&me_id, &row.id)?;
        }
        let author = db.find_identity_by_id(&row.author_id)?.identity()?;
        Ok(shape_comment(db, &row, &author, &Caller::User(me))?)
    })
    .await
}
