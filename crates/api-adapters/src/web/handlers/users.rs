use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{NewUser, UserPatch};

use crate::web::auth::CurrentActor;
use crate::web::dto::{UserBody, UserSearch};
use crate::web::error::ApiResult;
use crate::web::state::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(query): Query<UserSearch>,
) -> ApiResult<Json<Vec<UserBody>>> {
    let users = state.accounts.list_users(actor.get(), query.search).await?;
    Ok(Json(users.into_iter().map(UserBody::from).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(body): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<UserBody>)> {
    let user = state.accounts.create_user(actor.get(), body).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn me(State(state): State<AppState>, actor: CurrentActor) -> ApiResult<Json<UserBody>> {
    Ok(Json(state.accounts.me(actor.get()).await?.into()))
}

pub async fn update_me(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(patch): Json<UserPatch>,
) -> ApiResult<Json<UserBody>> {
    Ok(Json(state.accounts.update_me(actor.get(), patch).await?.into()))
}

pub async fn get_user(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(username): Path<String>,
) -> ApiResult<Json<UserBody>> {
    Ok(Json(state.accounts.get_user(actor.get(), &username).await?.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(username): Path<String>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<Json<UserBody>> {
    let user = state
        .accounts
        .update_user(actor.get(), &username, patch)
        .await?;
    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(username): Path<String>,
) -> ApiResult<StatusCode> {
    state.accounts.delete_user(actor.get(), &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
