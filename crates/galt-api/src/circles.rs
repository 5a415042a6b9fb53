use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use galt_db::models::CircleRow;
use galt_db::{Database, Relation};
use galt_types::api::{CircleResponse, CreateCircleRequest, UpdateCircleRequest, UserProfile};
use galt_types::models::{Circle, Identity};

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::guard;
use crate::middleware::AuthUser;

fn render(db: &Database, row: &CircleRow) -> Result<CircleResponse, ApiError> {
    let circle = Circle::try_from(row)?;
    Ok(CircleResponse {
        id: circle.id,
        name: circle.name,
        description: circle.description,
        member_count: db.relation(Relation::CircleMember).count(&row.id)?,
    })
}

/// Circles are private to their owner, for reading as well as writing.
fn owned_circle(db: &Database, id: Uuid, me: &Identity, action: &'static str) -> Result<CircleRow, ApiError> {
    let row = db.find_circle(&id.to_string())?;
    if !guard::can_mutate_or_delete(Circle::try_from(&row)?.owner_id, Some(me.id)) {
        return Err(ApiError::PermissionDenied(action));
    }
    Ok(row)
}

pub async fn list_circles(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<Vec<CircleResponse>>, ApiError> {
    let circles = blocking(&state, move |db| {
        db.circles_owned_by(&me.id.to_string())?
            .iter()
            .map(|row| render(db, row))
            .collect()
    })
    .await?;
    Ok(Json(circles))
}

pub async fn create_circle(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(req): Json<CreateCircleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Circle name is empty"));
    }

    let row = CircleRow {
        id: Uuid::new_v4().to_string(),
        owner_id: me.id.to_string(),
        name: req.name,
        description: req.description,
    };

    let circle = blocking(&state, move |db| {
        db.insert_circle(&row)?;
        render(db, &row)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(circle)))
}

pub async fn get_circle(
    State(state): State<AppState>,
    Path(circle_id): Path<Uuid>,
    AuthUser(me): AuthUser,
) -> Result<Json<CircleResponse>, ApiError> {
    let circle = blocking(&state, move |db| {
        let row = owned_circle(db, circle_id, &me, "view this circle")?;
        render(db, &row)
    })
    .await?;
    Ok(Json(circle))
}

pub async fn update_circle(
    State(state): State<AppState>,
    Path(circle_id): Path<Uuid>,
    AuthUser(me): AuthUser,
    Json(req): Json<UpdateCircleRequest>,
) -> Result<Json<CircleResponse>, ApiError> {
    let circle = blocking(&state, move |db| {
        let mut row = owned_circle(db, circle_id, &me, "edit this circle")?;
        if let Some(name) = req.name.filter(|n| !n.is_empty()) {
            row.name = name;
        }
        if let Some(description) = req.description.filter(|d| !d.is_empty()) {
            row.description = description;
        }
        db.update_circle(&row)?;
        render(db, &row)
    })
    .await?;
    Ok(Json(circle))
}

pub async fn delete_circle(
    State(state): State<AppState>,
    Path(circle_id): Path<Uuid>,
    AuthUser(me): AuthUser,
) -> Result<Json<CircleResponse>, ApiError> {
    let circle = blocking(&state, move |db| {
        let row = owned_circle(db, circle_id, &me, "delete this circle")?;
        let circle = render(db, &row)?;
        db.delete_circle(&row.id)?;
        Ok(circle)
    })
    .await?;
    Ok(Json(circle))
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(circle_id): Path<Uuid>,
    AuthUser(me): AuthUser,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let members = blocking(&state, move |db| {
        let row = owned_circle(db, circle_id, &me, "view this circle")?;
        db.relation(Relation::CircleMember)
            .actors(&row.id)?
            .iter()
            .map(|id| -> Result<UserProfile, ApiError> {
                let identity = db.find_identity_by_id(id)?.identity()?;
                Ok(UserProfile::from(&identity))
            })
            .collect()
    })
    .await?;
    Ok(Json(members))
}

pub async fn add_member(
    State(state): State<AppState>,
    Path((circle_id, user_id)): Path<(Uuid, Uuid)>,
    AuthUser(me): AuthUser,
) -> Result<Json<CircleResponse>, ApiError> {
    set_membership(&state, circle_id, user_id, me, true).await.map(Json)
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path((circle_id, user_id)): Path<(Uuid, Uuid)>,
    AuthUser(me): AuthUser,
) -> Result<Json<CircleResponse>, ApiError> {
    set_membership(&state, circle_id, user_id, me, false).await.map(Json)
}

async fn set_membership(
    state: &AppState,
    circle_id: Uuid,
    target: Uuid,
    me: Identity,
    member: bool,
) -> Result<CircleResponse, ApiError> {
    blocking(state, move |db| {
        let row = db.find_circle(&circle_id.to_string())?;
        let owner = Circle::try_from(&row)?.owner_id;
        if !guard::can_manage_circle_member(owner, Some(me.id), target) {
            return Err(ApiError::PermissionDenied("edit this circle"));
        }

        let target = db.find_identity_by_id(&target.to_string())?;
        let ledger = db.relation(Relation::CircleMember);
        if member {
            ledger.add(&target.id, &row.id)?;
        } else {
            ledger.remove(&target.id, &row.id)?;
        }
        render(db, &row)
    })
    .await
}
