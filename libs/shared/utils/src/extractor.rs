use axum::{
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
    body::Body,
};

use shared_models::auth::Session;
use shared_models::error::AppError;

/// Reads `Authorization: Bearer <key>` or `Token <key>` into a [`Session`].
pub fn session_from_headers(headers: &HeaderMap) -> Result<Session, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .or_else(|| auth_value.strip_prefix("Token "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    Ok(Session::from_token(token))
}

// The backend validates the key; the gateway only forwards it.
pub async fn auth_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let session = session_from_headers(request.headers())?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_bearer_and_token_schemes() {
        assert_eq!(session_from_headers(&headers_with("Bearer abc")).unwrap().token, "abc");
        assert_eq!(session_from_headers(&headers_with("Token xyz")).unwrap().token, "xyz");
    }

    #[test]
    fn rejects_missing_or_empty_credentials() {
        assert!(session_from_headers(&HeaderMap::new()).is_err());
        assert!(session_from_headers(&headers_with("Bearer ")).is_err());
        assert!(session_from_headers(&headers_with("Basic dXNlcjpwYXNz")).is_err());
    }
}
