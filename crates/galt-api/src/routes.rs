use axum::{
    Router,
    routing::{get, post, put},
};

use crate::auth::{self, AppState};
use crate::middleware::{AuthMode, gated};
use crate::{circles, comments, feed, statuses, users};

/// The whole HTTP surface, mounted under `/api/v1`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/accounts", post(auth::register))
        .route("/login", post(auth::login))
        .route("/users/{user_id}", get(users::get_user));

    let optional_routes = Router::new()
        .route("/statuses/{status_id}", get(statuses::get_status))
        .route("/statuses/{status_id}/comments", get(comments::list_comments))
        .route("/comments/{comment_id}", get(comments::get_thread));

    let protected_routes = Router::new()
        .route(
            "/profile",
            get(users::get_profile)
                .put(users::update_profile)
                .delete(users::delete_profile),
        )
        .route("/feed", get(feed::get_feed))
        .route("/statuses", post(statuses::post_status))
        .route(
            "/statuses/{status_id}",
            put(statuses::update_status).delete(statuses::delete_status),
        )
        .route(
            "/statuses/{status_id}/like",
            post(statuses::like_status).delete(statuses::unlike_status),
        )
        .route("/statuses/{status_id}/comments", post(comments::post_comment))
        .route(
            "/comments/{comment_id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/comments/{comment_id}/replies", post(comments::post_reply))
        .route(
            "/comments/{comment_id}/like",
            post(comments::like_comment).delete(comments::unlike_comment),
        )
        .route(
            "/circles",
            get(circles::list_circles).post(circles::create_circle),
        )
        .route(
            "/circles/{circle_id}",
            get(circles::get_circle)
                .put(circles::update_circle)
                .delete(circles::delete_circle),
        )
        .route("/circles/{circle_id}/members", get(circles::list_members))
        .route(
            "/circles/{circle_id}/members/{user_id}",
            put(circles::add_member).delete(circles::remove_member),
        );

    let api = Router::new()
        .merge(gated(AuthMode::None, &state, public_routes))
        .merge(gated(AuthMode::Optional, &state, optional_routes))
        .merge(gated(AuthMode::Required, &state, protected_routes));

    Router::new().nest("/api/v1", api).with_state(state)
}
