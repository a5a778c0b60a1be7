use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Audit logging middleware.
///
/// Logs every API request as a structured `api_request` event. Classification
/// changes are attributable to a ward and patient through the path.
pub async fn audit_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    if response.status().is_server_error() {
        tracing::warn!(method = %method, path = %uri, status = status, "api_request");
    } else {
        tracing::info!(method = %method, path = %uri, status = status, "api_request");
    }

    response
}
