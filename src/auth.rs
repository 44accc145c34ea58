use crate::errors::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Header set by the identity proxy in front of the service.
pub const USER_HEADER: &str = "x-user-id";

/// The verified caller. Entries are stored and read under this id only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| AuthUser(value.to_string()))
            .ok_or_else(AppError::unauthorized)
    }
}
