//! Bearer-token authentication for Axum.
//!
//! [`authenticate`] guards a route: a request without a valid token is
//! answered with 401 and never reaches the handler. On success the decoded
//! [`Principal`] is attached to the request extensions.
//!
//! Handlers take [`Principal`] as an extractor. It reuses the attached value
//! when the middleware ran and otherwise verifies the header itself, so a
//! handler is never less strict than the route it is mounted on.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use super::{error::AuthError, token::TokenCodec};
use crate::core_types::UserId;

/// The authenticated caller of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
}

/// Extract `<token>` from `Authorization: Bearer <token>`.
///
/// Exactly two space-separated parts with a `Bearer` scheme (any case) are
/// required. Anything else, including a missing header, yields `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() =>
        {
            Some(token)
        }
        _ => None,
    }
}

/// Verify the request's bearer token and derive the principal.
pub fn authenticate_headers(
    tokens: &TokenCodec,
    headers: &HeaderMap,
) -> Result<Principal, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::InvalidToken)?;
    let claims = tokens.verify(token)?;
    Ok(Principal {
        user_id: claims.user_id,
    })
}

/// Axum middleware for routes that require a logged-in user.
pub async fn authenticate(
    State(tokens): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = authenticate_headers(&tokens, request.headers()).inspect_err(|_| {
        tracing::debug!(
            "Rejected unauthenticated {} {}",
            request.method(),
            request.uri().path()
        );
    })?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    Arc<TokenCodec>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(*principal);
        }

        let tokens = Arc::<TokenCodec>::from_ref(state);
        authenticate_headers(&tokens, &parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(b"middleware-test-secret-0123456789abcdef", Duration::hours(6))
    }

    #[test]
    fn test_bearer_token_valid() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn test_bearer_token_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_bearer_token_wrong_shape() {
        for value in [
            "abc.def.ghi",
            "Basic dXNlcjpwYXNz",
            "Token abc",
            "Bearer",
            "Bearer ",
            "Bearer a b",
            "Bearer  abc",
            "",
        ] {
            assert_eq!(bearer_token(&headers(value)), None, "{:?}", value);
        }
    }

    #[test]
    fn test_authenticate_headers() {
        let codec = codec();
        let token = codec.issue(42).unwrap();

        let principal = authenticate_headers(&codec, &headers(&format!("Bearer {}", token))).unwrap();
        assert_eq!(principal.user_id, 42);

        assert!(matches!(
            authenticate_headers(&codec, &headers(&token)),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            authenticate_headers(&codec, &HeaderMap::new()),
            Err(AuthError::InvalidToken)
        ));
    }
}
