use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::error::AppError;

pub const BAD_HEADER: &str = "Missing or malformed Authorization header";
pub const BAD_TOKEN: &str = "Invalid or expired token";

/// Extracts and validates the bearer token, yielding the caller's user ID.
///
/// Identity is taken from the token alone; the credential store is not consulted.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// Splits `Bearer <token>` into its token. Exactly one space, scheme matched case-sensitively.
pub fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            warn!("auth: missing Authorization header");
            return Err(AppError::Unauthorized(BAD_HEADER));
        };

        let token = header.to_str().ok().and_then(bearer_token).ok_or_else(|| {
            warn!("auth: malformed Authorization header");
            AppError::Unauthorized(BAD_HEADER)
        })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(reason = %e, "auth: token rejected");
            AppError::Unauthorized(BAD_TOKEN)
        })?;

        Ok(AuthUser(claims.sub))
    }
}
