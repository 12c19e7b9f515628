//! Credential administration endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::types::{ApiError, Json};
use crate::domain::{AccountId, CredentialRecord, DomainError, IssuedCredential};

use super::state::AppState;

/// Body of POST /tokens
#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    #[serde(rename = "accountID", alias = "account_id")]
    pub account_id: String,
    pub quota: u64,
}

/// Returned once, at creation; the only response that carries the secret
#[derive(Debug, Serialize)]
pub struct CreatedTokenResponse {
    pub account_id: String,
    pub token: String,
    pub quota: u64,
}

impl From<IssuedCredential> for CreatedTokenResponse {
    fn from(issued: IssuedCredential) -> Self {
        Self {
            account_id: issued.account_id.into(),
            token: issued.secret.into_inner(),
            quota: issued.quota,
        }
    }
}

/// Administrative view of a credential
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub account_id: String,
    pub quota: u64,
    pub quota_usage: u64,
    pub token_hint: String,
}

impl From<&CredentialRecord> for TokenResponse {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            account_id: record.account_id().to_string(),
            quota: record.quota(),
            quota_usage: record.quota_usage(),
            token_hint: record.secret().hint(),
        }
    }
}

fn parse_account_id(raw: String) -> Result<AccountId, ApiError> {
    AccountId::new(raw).map_err(|e| ApiError::from(DomainError::from(e)))
}

/// POST /tokens
pub async fn create_token(
    State(state): State<AppState>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = parse_account_id(request.account_id)?;
    let issued = state.credentials.create(account_id, request.quota).await?;

    Ok((StatusCode::CREATED, Json(CreatedTokenResponse::from(issued))))
}

/// GET /tokens
pub async fn list_tokens(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let records = state.credentials.list().await?;
    let tokens: Vec<TokenResponse> = records.iter().map(TokenResponse::from).collect();

    debug!(count = tokens.len(), "Listed credentials");

    Ok(Json(tokens))
}

/// GET /tokens/{account_id}
pub async fn get_token(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = AccountId::new(account_id).map_err(|_| ApiError::not_found("Token not found"))?;

    match state.credentials.get(&account_id).await {
        Ok(record) => Ok(Json(TokenResponse::from(&record))),
        Err(DomainError::NotFound { .. }) => Err(ApiError::not_found("Token not found")),
        Err(e) => Err(e.into()),
    }
}

/// DELETE /tokens/{account_id}
pub async fn delete_token(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // An ID that could never have been stored has nothing to delete.
    if let Ok(account_id) = AccountId::new(account_id) {
        state.credentials.delete(&account_id).await?;
    }

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CredentialSecret;

    #[test]
    fn test_create_request_accepts_both_field_names() {
        let camel: CreateTokenRequest =
            serde_json::from_str(r#"{"accountID": "acme", "quota": 10}"#).unwrap();
        let snake: CreateTokenRequest =
            serde_json::from_str(r#"{"account_id": "acme", "quota": 10}"#).unwrap();

        assert_eq!(camel.account_id, "acme");
        assert_eq!(snake.account_id, "acme");
        assert_eq!(snake.quota, 10);
    }

    #[test]
    fn test_create_request_rejects_negative_quota() {
        let result: Result<CreateTokenRequest, _> =
            serde_json::from_str(r#"{"accountID": "acme", "quota": -1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_token_response_never_carries_secret() {
        let secret = CredentialSecret::new("0123456789abcdef0123456789abcdef");
        let record = CredentialRecord::new(AccountId::new("acme").unwrap(), secret, 10)
            .with_quota_usage(3);

        let json = serde_json::to_string(&TokenResponse::from(&record)).unwrap();
        assert!(!json.contains("0123456789abcdef0123456789abcdef"));
        assert!(json.contains("\"token_hint\":\"0123…\""));
        assert!(json.contains("\"quota_usage\":3"));
    }
}
