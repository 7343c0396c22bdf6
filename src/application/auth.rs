use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use tracing::warn;

use crate::application::errors::AppError;

/// Bearer token from the `Authorization` header.
///
/// The functions gateway verifies the token itself; handlers only require
/// that the caller presented one.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header.to_str().map_err(|err| {
            warn!(error = %err, "authorization header contains invalid characters");
            AppError::Unauthorized
        })?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(Self(token.to_string()))
    }
}
