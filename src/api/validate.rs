//! Authorization check endpoint

use axum::{extract::State, response::IntoResponse};
use serde::Serialize;

use crate::api::middleware::PresentedSecret;
use crate::api::types::{ApiError, Json};
use crate::domain::AuthorizationVerdict;

use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub verdict: AuthorizationVerdict,
}

/// GET /validate - authorize the presented secret and consume one unit of quota
pub async fn validate(
    State(state): State<AppState>,
    PresentedSecret(secret): PresentedSecret,
) -> Result<impl IntoResponse, ApiError> {
    let verdict = state.authorizer.authorize(&secret).await?;

    match ApiError::from_verdict(verdict) {
        Some(rejection) => Err(rejection),
        None => Ok(Json(ValidateResponse { verdict })),
    }
}
