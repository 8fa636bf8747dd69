use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use domains::{Actor, DomainError};

use super::error::ApiError;
use super::state::AppState;

/// The caller behind `Authorization: Bearer <token>`, or `None` without the
/// header. A header that does not resolve to a live account is a 401.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Option<Actor>);

impl CurrentActor {
    pub fn get(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(None));
        };
        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError(DomainError::Unauthenticated))?;

        let actor = state.accounts.authenticate(token).await?;
        Ok(Self(Some(actor)))
    }
}
