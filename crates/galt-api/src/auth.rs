use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info};
use uuid::Uuid;

use galt_db::{Database, DbError};
use galt_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::token::TokenCodec;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenCodec,
}

const MAX_USERNAME_LEN: usize = 32;

/// Runs store work on the blocking pool. The closure sees the database and
/// reports failures as [`ApiError`] so ownership checks can sit next to the
/// writes they guard.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
}

pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal
        })
}

/// Only a missing row means the name is free; store failures propagate.
fn ensure_username_free(db: &Database, username: &str) -> Result<(), ApiError> {
    match db.find_identity_by_username(username) {
        Ok(_) => Err(ApiError::DuplicateUsername),
        Err(DbError::NotFound(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn verify_password(password: &str, stored: &str) -> Result<(), ApiError> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!("Stored password hash is unreadable: {}", e);
        ApiError::Internal
    })?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::InvalidCredentials)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("No username or password entered"));
    }
    if req.username.chars().count() > MAX_USERNAME_LEN
        || req.username.chars().any(char::is_whitespace)
    {
        return Err(ApiError::BadRequest("Invalid username"));
    }

    let user_id = Uuid::new_v4();
    let username = req.username;

    blocking(&state, move |db| {
        // Reject before paying for the hash; insert_identity re-checks.
        ensure_username_free(db, &username)?;
        let password_hash = hash_password(&req.password)?;
        db.insert_identity(&user_id.to_string(), &username, &password_hash)?;
        info!("Registered {} ({})", username, user_id);
        Ok(())
    })
    .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = blocking(&state, move |db| {
        let user = db
            .find_identity_by_username(&req.username)
            .map_err(|e| match ApiError::from(e) {
                ApiError::NotFound(_) => ApiError::InvalidCredentials,
                other => other,
            })?;
        verify_password(&req.password, &user.password)?;
        Ok(user.identity()?)
    })
    .await?;

    let token = state.tokens.issue(user.id).map_err(|e| {
        error!("{}", e);
        ApiError::Internal
    })?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
        token,
    }))
}
