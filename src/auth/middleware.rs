use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::AuthKeys;
use crate::Error;

/// Token from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that requires an admin session token
///
/// A valid customer token gets 403 instead of 401: the caller is known, just not allowed.
pub async fn require_admin(State(keys): State<Arc<AuthKeys>>, mut req: Request, next: Next) -> Result<Response, Error> {
    let token = bearer_token(req.headers()).ok_or(Error::Unauthorized)?;

    let claims = match keys.verify_admin(token) {
        Ok(claims) => claims,
        Err(Error::Unauthorized) if keys.verify_customer(token).is_ok() => return Err(Error::Forbidden),
        Err(e) => return Err(e),
    };

    // Handlers can pick the claims up through Extension<AdminClaims>.
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}
