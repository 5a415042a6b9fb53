//! The auth gate.
//!
//! Each route group is mounted under one [`AuthMode`]. Gated groups get a
//! [`Caller`] in the request extensions before the handler runs; handlers that
//! need a signed-in user take [`AuthUser`], which cannot be built from an
//! anonymous caller.

use std::convert::Infallible;

use axum::{
    Router,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::{self, Next},
    response::Response,
};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use galt_types::models::Identity;

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::token::{TokenError, is_well_formed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// No resolution; handlers never see a caller.
    None,
    /// Resolve if possible, otherwise carry on anonymously.
    Optional,
    /// Resolve or reject with 401 before the handler runs.
    Required,
}

/// Who is making the request.
#[derive(Debug, Clone)]
pub enum Caller {
    Anonymous,
    User(Identity),
}

impl Caller {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::User(identity) => Some(identity),
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.identity().map(|identity| identity.id)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Caller>()
            .cloned()
            .unwrap_or(Caller::Anonymous))
    }
}

/// A caller known to be signed in.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Caller>() {
            Some(Caller::User(identity)) => Ok(AuthUser(identity.clone())),
            _ => Err(ApiError::AuthRejected),
        }
    }
}

/// Why a request carries no usable identity. Diagnostic only: every variant
/// except `Lookup` is handled identically.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("no Authorization header")]
    MissingHeader,

    #[error("Authorization header is not a bearer token")]
    MalformedHeader,

    #[error(transparent)]
    InvalidToken(#[from] TokenError),

    #[error("token subject {0} no longer exists")]
    UnknownSubject(Uuid),

    #[error("identity lookup failed")]
    Lookup,
}

/// Header → token → subject → identity. Re-reads the store every time, so a
/// deleted account stops authenticating on its next request.
pub async fn resolve_caller(state: &AppState, headers: &HeaderMap) -> Result<Identity, AuthFailure> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthFailure::MissingHeader)?;

    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| is_well_formed(t))
        .ok_or(AuthFailure::MalformedHeader)?;

    let subject = state.tokens.verify(token)?;

    let id = subject.to_string();
    match blocking(state, move |db| Ok(db.find_identity_by_id(&id)?.identity()?)).await {
        Ok(identity) => Ok(identity),
        Err(ApiError::NotFound(_)) => Err(AuthFailure::UnknownSubject(subject)),
        Err(_) => Err(AuthFailure::Lookup),
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match resolve_caller(&state, req.headers()).await {
        Ok(identity) => {
            req.extensions_mut().insert(Caller::User(identity));
            Ok(next.run(req).await)
        }
        Err(AuthFailure::Lookup) => Err(ApiError::Internal),
        Err(failure) => {
            debug!("Rejecting {} {}: {}", req.method(), req.uri().path(), failure);
            Err(ApiError::AuthRejected)
        }
    }
}

pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let caller = match resolve_caller(&state, req.headers()).await {
        Ok(identity) => Caller::User(identity),
        Err(AuthFailure::MissingHeader) => Caller::Anonymous,
        Err(AuthFailure::Lookup) => {
            warn!("Identity lookup failed; serving {} anonymously", req.uri().path());
            Caller::Anonymous
        }
        Err(failure) => {
            debug!("Treating caller as anonymous: {}", failure);
            Caller::Anonymous
        }
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}

/// Puts `routes` behind the gate for `mode`.
pub fn gated(mode: AuthMode, state: &AppState, routes: Router<AppState>) -> Router<AppState> {
    match mode {
        AuthMode::None => routes,
        AuthMode::Optional => {
            routes.route_layer(middleware::from_fn_with_state(state.clone(), optional_auth))
        }
        AuthMode::Required => {
            routes.route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        }
    }
}
