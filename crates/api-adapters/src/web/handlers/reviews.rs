use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Comment, Review};
use services::{CommentDraft, ReviewDraft};
use uuid::Uuid;

use crate::web::auth::CurrentActor;
use crate::web::dto::{CommentBody, ReviewBody};
use crate::web::error::ApiResult;
use crate::web::state::AppState;

async fn review_body(state: &AppState, review: Review) -> ApiResult<ReviewBody> {
    let author = state.accounts.username_of(review.post.author_id).await?;
    Ok(ReviewBody {
        id: review.id,
        text: review.post.text,
        author,
        score: review.score.value(),
        pub_date: review.post.pub_date,
    })
}

async fn comment_body(state: &AppState, comment: Comment) -> ApiResult<CommentBody> {
    let author = state.accounts.username_of(comment.post.author_id).await?;
    Ok(CommentBody {
        id: comment.id,
        text: comment.post.text,
        author,
        pub_date: comment.post.pub_date,
    })
}

// ── Reviews ─────────────────────────────────────────────────────────────────

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(title_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ReviewBody>>> {
    let mut bodies = Vec::new();
    for review in state.reviews.list_reviews(title_id).await? {
        bodies.push(review_body(&state, review).await?);
    }
    Ok(Json(bodies))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ReviewBody>> {
    let review = state.reviews.get_review(title_id, review_id).await?;
    Ok(Json(review_body(&state, review).await?))
}

pub async fn create_review(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(title_id): Path<Uuid>,
    Json(draft): Json<ReviewDraft>,
) -> ApiResult<(StatusCode, Json<ReviewBody>)> {
    let review = state
        .reviews
        .create_review(actor.get(), title_id, draft)
        .await?;
    state.metrics.reviews_created.inc();
    Ok((StatusCode::CREATED, Json(review_body(&state, review).await?)))
}

pub async fn update_review(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
    Json(draft): Json<ReviewDraft>,
) -> ApiResult<Json<ReviewBody>> {
    let review = state
        .reviews
        .update_review(actor.get(), title_id, review_id, draft)
        .await?;
    Ok(Json(review_body(&state, review).await?))
}

pub async fn delete_review(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .reviews
        .delete_review(actor.get(), title_id, review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Comments ────────────────────────────────────────────────────────────────

pub async fn list_comments(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<CommentBody>>> {
    let mut bodies = Vec::new();
    for comment in state.reviews.list_comments(title_id, review_id).await? {
        bodies.push(comment_body(&state, comment).await?);
    }
    Ok(Json(bodies))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<CommentBody>> {
    let comment = state
        .reviews
        .get_comment(title_id, review_id, comment_id)
        .await?;
    Ok(Json(comment_body(&state, comment).await?))
}

pub async fn create_comment(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
    Json(draft): Json<CommentDraft>,
) -> ApiResult<(StatusCode, Json<CommentBody>)> {
    let comment = state
        .reviews
        .create_comment(actor.get(), title_id, review_id, draft)
        .await?;
    state.metrics.comments_created.inc();
    Ok((StatusCode::CREATED, Json(comment_body(&state, comment).await?)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path((title_id, review_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(draft): Json<CommentDraft>,
) -> ApiResult<Json<CommentBody>> {
    let comment = state
        .reviews
        .update_comment(actor.get(), title_id, review_id, comment_id, draft)
        .await?;
    Ok(Json(comment_body(&state, comment).await?))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path((title_id, review_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .reviews
        .delete_comment(actor.get(), title_id, review_id, comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
