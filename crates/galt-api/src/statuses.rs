use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use galt_db::models::{StatusRow, now_timestamp};
use galt_db::{Database, Relation};
use galt_types::api::{ContentRequest, StatusView};
use galt_types::models::{Identity, Status};

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::guard;
use crate::middleware::{AuthUser, Caller};
use crate::shape::shape_status;

pub(crate) fn validate_content(content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content is empty"));
    }
    Ok(())
}

/// Loads a status the caller owns, or explains why not.
fn owned_status(db: &Database, id: &str, me: &Identity, action: &'static str) -> Result<StatusRow, ApiError> {
    let row = db.find_status(id)?;
    if !guard::can_mutate_or_delete(Status::try_from(&row)?.author_id, Some(me.id)) {
        return Err(ApiError::PermissionDenied(action));
    }
    Ok(row)
}

fn render(db: &Database, row: &StatusRow, caller: &Caller) -> Result<StatusView, ApiError> {
    let author = db.find_identity_by_id(&row.author_id)?.identity()?;
    Ok(shape_status(db, row, &author, caller)?)
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
    caller: Caller,
) -> Result<Json<StatusView>, ApiError> {
    let view = blocking(&state, move |db| {
        let row = db.find_status(&status_id.to_string())?;
        render(db, &row, &caller)
    })
    .await?;
    Ok(Json(view))
}

pub async fn post_status(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(req): Json<ContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_content(&req.content)?;

    let row = StatusRow {
        id: Uuid::new_v4().to_string(),
        author_id: me.id.to_string(),
        content: req.content,
        posted_at: now_timestamp(),
        edited: false,
    };

    let view = blocking(&state, move |db| {
        db.insert_status(&row)?;
        Ok(shape_status(db, &row, &me, &Caller::User(me.clone()))?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Replaces the content; the status is marked edited and re-stamped.
pub async fn update_status(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
    AuthUser(me): AuthUser,
    Json(req): Json<ContentRequest>,
) -> Result<Json<StatusView>, ApiError> {
    validate_content(&req.content)?;

    let view = blocking(&state, move |db| {
        let mut row = owned_status(db, &status_id.to_string(), &me, "edit this status")?;
        row.content = req.content;
        row.posted_at = now_timestamp();
        row.edited = true;
        db.update_status(&row)?;
        Ok(shape_status(db, &row, &me, &Caller::User(me.clone()))?)
    })
    .await?;

    Ok(Json(view))
}

/// Responds with the status as it was just before deletion.
pub async fn delete_status(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
    AuthUser(me): AuthUser,
) -> Result<Json<StatusView>, ApiError> {
    let view = blocking(&state, move |db| {
        let row = owned_status(db, &status_id.to_string(), &me, "delete this status")?;
        let view = shape_status(db, &row, &me, &Caller::User(me.clone()))?;
        db.delete_status(&row.id)?;
        Ok(view)
    })
    .await?;

    Ok(Json(view))
}

pub async fn like_status(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
    AuthUser(me): AuthUser,
) -> Result<Json<StatusView>, ApiError> {
    set_like(&state, status_id, me, true).await.map(Json)
}

pub async fn unlike_status(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
    AuthUser(me): AuthUser,
) -> Result<Json<StatusView>, ApiError> {
    set_like(&state, status_id, me, false).await.map(Json)
}

async fn set_like(
    state: &AppState,
    status_id: Uuid,
    me: Identity,
    liked: bool,
) -> Result<StatusView, ApiError> {
    blocking(state, move |db| {
        let row = db.find_status(&status_id.to_string())?;
        let ledger = db.relation(Relation::StatusLike);
        let me_id = me.id.to_string();
        if liked {
            ledger.add(&me_id, &row.id)?;
        } else {
            ledger.remove(&me_id, &row.id)?;
        }
        render(db, &row, &Caller::User(me))
    })
    .await
}
