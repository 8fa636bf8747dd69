//! # HTTP routing (axum)
//!
//! Everything is mounted under `/api/v1` except the Prometheus scrape
//! endpoint. Paths keep their trailing slash.

mod auth;
mod dto;
mod error;
mod handlers;
mod state;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use auth::CurrentActor;
pub use error::{ApiError, ApiResult};
pub use state::{AppState, AuthPorts};

use handlers::{auth as signup, catalog, reviews, users};

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Registration
        .route("/auth/signup/", post(signup::sign_up))
        .route("/auth/token/", post(signup::obtain_token))
        // Catalog
        .route(
            "/categories/",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route("/categories/{slug}/", delete(catalog::delete_category))
        .route("/genres/", get(catalog::list_genres).post(catalog::create_genre))
        .route("/genres/{slug}/", delete(catalog::delete_genre))
        .route("/titles/", get(catalog::list_titles).post(catalog::create_title))
        .route(
            "/titles/{title_id}/",
            get(catalog::get_title)
                .patch(catalog::update_title)
                .delete(catalog::delete_title),
        )
        // Reviews & comments
        .route(
            "/titles/{title_id}/reviews/",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/",
            get(reviews::get_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/",
            get(reviews::list_comments).post(reviews::create_comment),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/",
            get(reviews::get_comment)
                .patch(reviews::update_comment)
                .delete(reviews::delete_comment),
        )
        // Accounts
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/me/", get(users::me).patch(users::update_me))
        .route(
            "/users/{username}/",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        );

    Router::new()
        .nest("/api/v1", api)
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                "application/openmetrics-text; version=1.0.0; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
