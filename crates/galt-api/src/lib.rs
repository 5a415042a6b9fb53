pub mod auth;
pub mod circles;
pub mod comments;
pub mod error;
pub mod feed;
pub mod guard;
pub mod middleware;
pub mod routes;
pub mod shape;
pub mod statuses;
pub mod token;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;
