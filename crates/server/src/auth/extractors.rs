use axum::{extract::FromRequestParts, http::request::Parts};
use shared_types::AppError;
use uuid::Uuid;

use super::jwt::Claims;

/// Extractor that requires authentication. Returns 401 if no valid token.
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// The caller's user id, used as the owner of every todo operation.
    pub fn id(&self) -> Uuid {
        self.0.sub
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}
