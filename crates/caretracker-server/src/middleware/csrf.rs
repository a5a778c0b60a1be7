use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

pub const CSRF_HEADER: &str = "x-csrftoken";

/// Double-submit CSRF check.
///
/// Mutating requests must echo the CSRF cookie in the `X-CSRFToken` header.
/// Safe methods pass untouched.
pub async fn require_csrf(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_safe(req.method()) {
        return Ok(next.run(req).await);
    }

    let cookie = cookie_value(req.headers(), &state.config.csrf_cookie);
    let header = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    let verified = matches!(
        (cookie, header),
        (Some(cookie), Some(header)) if !cookie.is_empty() && cookie == header
    );
    if verified {
        return Ok(next.run(req).await);
    }

    tracing::warn!(
        method = %req.method(),
        path = %req.uri().path(),
        "csrf check failed"
    );
    Err(ApiError::Forbidden("CSRF verification failed".to_string()))
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Value of the cookie `name` from any `Cookie` header.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}
