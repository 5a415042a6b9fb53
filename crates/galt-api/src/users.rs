use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;
use uuid::Uuid;

use galt_types::api::{UpdateProfileRequest, UserProfile};

use crate::auth::{AppState, blocking, hash_password};
use crate::error::ApiError;
use crate::middleware::AuthUser;

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    let identity = blocking(&state, move |db| {
        Ok(db.find_identity_by_id(&user_id.to_string())?.identity()?)
    })
    .await?;
    Ok(Json(UserProfile::from(&identity)))
}

pub async fn get_profile(AuthUser(me): AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(&me))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    if req.password.as_deref() == Some("") {
        return Err(ApiError::BadRequest("Password is empty"));
    }

    let identity = blocking(&state, move |db| {
        let mut user = db.find_identity_by_id(&me.id.to_string())?;
        if let Some(description) = req.description {
            user.description = description;
        }
        if let Some(profile_image_ref) = req.profile_image_ref {
            user.profile_image_ref = profile_image_ref;
        }
        if let Some(password) = req.password {
            user.password = hash_password(&password)?;
        }
        db.update_identity(&user)?;
        Ok(user.identity()?)
    })
    .await?;

    Ok(Json(UserProfile::from(&identity)))
}

/// Deletes the caller's account along with everything it owns. Outstanding
/// tokens stop working because the gate can no longer find the subject.
pub async fn delete_profile(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = UserProfile::from(&me);
    blocking(&state, move |db| Ok(db.delete_identity(&me.id.to_string())?)).await?;
    info!("Deleted account {} ({})", profile.username, profile.id);
    Ok(Json(profile))
}
