//! Presented-secret extraction

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::api::types::ApiError;
use crate::domain::CredentialSecret;

const MISSING_SECRET: &str = "Authorization header is required";

/// Extractor for the bearer secret a caller presents
///
/// Read from, in order:
/// - Authorization header: `Bearer <secret>` or the bare secret
/// - X-API-Key header: `<secret>`
#[derive(Debug, Clone)]
pub struct PresentedSecret(pub CredentialSecret);

impl<S> FromRequestParts<S> for PresentedSecret
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_secret_from_headers(&parts.headers).map(PresentedSecret)
    }
}

fn extract_secret_from_headers(headers: &HeaderMap) -> Result<CredentialSecret, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .unwrap_or(auth_str)
            .trim();

        if !token.is_empty() {
            return Ok(CredentialSecret::new(token));
        }
    }

    if let Some(api_key_header) = headers.get("x-api-key") {
        let key = api_key_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid X-API-Key header encoding"))?
            .trim();

        if !key.is_empty() {
            return Ok(CredentialSecret::new(key));
        }
    }

    Err(ApiError::bad_request(MISSING_SECRET))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_raw_authorization_value() {
        let secret = extract_secret_from_headers(&headers(&[("authorization", "abc123")])).unwrap();
        assert_eq!(secret.expose(), "abc123");
    }

    #[test]
    fn test_bearer_authorization_value() {
        let secret =
            extract_secret_from_headers(&headers(&[("authorization", "Bearer abc123")])).unwrap();
        assert_eq!(secret.expose(), "abc123");
    }

    #[test]
    fn test_x_api_key_header() {
        let secret = extract_secret_from_headers(&headers(&[("x-api-key", "abc123")])).unwrap();
        assert_eq!(secret.expose(), "abc123");
    }

    #[test]
    fn test_authorization_takes_precedence() {
        let secret = extract_secret_from_headers(&headers(&[
            ("authorization", "first"),
            ("x-api-key", "second"),
        ]))
        .unwrap();
        assert_eq!(secret.expose(), "first");
    }

    #[test]
    fn test_missing_or_empty_is_bad_request() {
        for map in [
            headers(&[]),
            headers(&[("authorization", "")]),
            headers(&[("authorization", "Bearer ")]),
            headers(&[("x-api-key", "  ")]),
        ] {
            let err = extract_secret_from_headers(&map).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.response.error.message, MISSING_SECRET);
        }
    }
}
