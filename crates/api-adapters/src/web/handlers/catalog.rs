use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Category, Genre, TitleDraft};
use services::{TitleFilter, TitleView};
use uuid::Uuid;

use crate::web::auth::CurrentActor;
use crate::web::dto::NamedSlugRequest;
use crate::web::error::ApiResult;
use crate::web::state::AppState;

// ── Categories ──────────────────────────────────────────────────────────────

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.catalog.list_categories().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(body): Json<NamedSlugRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state
        .catalog
        .create_category(actor.get(), &body.name, &body.slug)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_category(actor.get(), &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Genres ──────────────────────────────────────────────────────────────────

pub async fn list_genres(State(state): State<AppState>) -> ApiResult<Json<Vec<Genre>>> {
    Ok(Json(state.catalog.list_genres().await?))
}

pub async fn create_genre(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(body): Json<NamedSlugRequest>,
) -> ApiResult<(StatusCode, Json<Genre>)> {
    let genre = state
        .catalog
        .create_genre(actor.get(), &body.name, &body.slug)
        .await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

pub async fn delete_genre(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_genre(actor.get(), &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Titles ──────────────────────────────────────────────────────────────────

pub async fn list_titles(
    State(state): State<AppState>,
    Query(filter): Query<TitleFilter>,
) -> ApiResult<Json<Vec<TitleView>>> {
    Ok(Json(state.catalog.list_titles(&filter).await?))
}

pub async fn get_title(
    State(state): State<AppState>,
    Path(title_id): Path<Uuid>,
) -> ApiResult<Json<TitleView>> {
    Ok(Json(state.catalog.get_title(title_id).await?))
}

pub async fn create_title(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(draft): Json<TitleDraft>,
) -> ApiResult<(StatusCode, Json<TitleView>)> {
    let view = state.catalog.create_title(actor.get(), draft).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_title(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(title_id): Path<Uuid>,
    Json(draft): Json<TitleDraft>,
) -> ApiResult<Json<TitleView>> {
    Ok(Json(
        state.catalog.update_title(actor.get(), title_id, draft).await?,
    ))
}

pub async fn delete_title(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(title_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_title(actor.get(), title_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
