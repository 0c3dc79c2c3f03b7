use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use super::jwt::JwtKeys;

/// Permissive auth middleware.
///
/// Resolves the credential in `Authorization` and, when valid, inserts the
/// `Claims` into request extensions. Never rejects: handlers that need an
/// identity use the `AuthUser` extractor.
pub async fn auth_middleware(
    State(keys): State<Arc<JwtKeys>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(req.headers()) {
        match keys.validate(token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid credential");
            }
        }
    }

    next.run(req).await
}

/// Token from `Authorization: Bearer <token>`, or a bare token in the same
/// header as older clients send it.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some(_) => return None,
        None if value.eq_ignore_ascii_case("bearer") => return None,
        None => value,
    };
    (!token.is_empty()).then_some(token)
}
