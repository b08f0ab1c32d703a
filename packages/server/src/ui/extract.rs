//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;
use crate::domain::UserId;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The identity of the user making the request.
#[derive(Debug, Clone)]
pub struct Caller(pub UserId);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        UserId::new(value.to_string())
            .map(Caller)
            .map_err(|_| ApiError::Unauthorized)
    }
}
