use crate::core::error::AppError;
use crate::features::auth::models::SessionToken;
use crate::features::auth::services::SessionService;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

use crate::shared::constants::SESSION_COOKIE;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let auth_header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok());

            if let Some(auth_header) = auth_header {
                if let Some(encoded) = auth_header.strip_prefix("Basic ") {
                    if let Ok(decoded) = BASE64_STANDARD.decode(encoded) {
                        if let Ok(creds) = String::from_utf8(decoded) {
                            if creds == *credentials {
                                return Ok(next.run(req).await);
                            }
                        }
                    }
                }
            }

            let response = Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .header(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")
                .body(Body::from("Unauthorized"))
                .unwrap();

            Err(response)
        })
    }
}

/// Session auth gate for protected routes.
///
/// Accepts the session token from `Authorization: Bearer <token>` or the
/// session cookie, resolves it to the full user record (the session principal
/// is the user's email, re-resolved on every request) and stores the result
/// in the request extensions for the `AuthenticatedUser` extractor.
pub async fn session_auth_middleware(
    State(sessions): State<Arc<SessionService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(&req)
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let user = sessions.resolve(&token).await?;

    req.extensions_mut().insert(user);
    // Logout needs the raw token to revoke the session
    req.extensions_mut().insert(SessionToken(token));
    Ok(next.run(req).await)
}

fn extract_session_token(req: &Request) -> Option<String> {
    if let Some(auth_header) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    // Fall back to the session cookie
    req.headers()
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(session_cookie_value)
}

fn session_cookie_value(cookie_header: &str) -> Option<String> {
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_is_extracted_by_name() {
        let header = format!("other=1; {}=abc123; theme=dark", SESSION_COOKIE);
        assert_eq!(session_cookie_value(&header), Some("abc123".to_string()));
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert_eq!(session_cookie_value("other=1; theme=dark"), None);
        assert_eq!(session_cookie_value(""), None);
    }

    #[test]
    fn bearer_token_takes_precedence_over_cookie() {
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Bearer from-header")
            .header(header::COOKIE, format!("{}=from-cookie", SESSION_COOKIE))
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_session_token(&req), Some("from-header".to_string()));
    }
}
