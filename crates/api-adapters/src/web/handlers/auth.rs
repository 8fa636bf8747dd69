use axum::extract::State;
use axum::Json;

use crate::web::dto::{SignUpRequest, SignUpResponse, TokenRequest, TokenResponse};
use crate::web::error::ApiResult;
use crate::web::state::AppState;

/// Registers a new account or re-sends the code for a pending one.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> ApiResult<Json<SignUpResponse>> {
    let user = state.accounts.sign_up(&body.username, &body.email).await?;
    state.metrics.signups.inc();
    Ok(Json(SignUpResponse {
        username: user.username,
        email: user.email,
    }))
}

pub async fn obtain_token(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token = state
        .accounts
        .obtain_token(&body.username, &body.confirmation_code)
        .await?;
    state.metrics.tokens_issued.inc();
    Ok(Json(TokenResponse { token }))
}
