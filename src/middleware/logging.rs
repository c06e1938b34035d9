use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;

/// Middleware that logs each request/response pair with a correlation id.
///
/// Bodies are buffered (capped at 1MB) so webhook handlers downstream still
/// see the exact raw bytes for signature verification.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, 1024 * 1024).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(request_id = %request_id, "Failed to read request body: {}", e);
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        body_bytes = bytes.len(),
        "→ Request"
    );
    tracing::debug!(
        request_id = %request_id,
        body = %preview(&bytes, 2000),
        "Request body"
    );

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let status = response.status();
    let (parts, body) = response.into_parts();

    let bytes = match to_bytes(body, 1024 * 1024).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(request_id = %request_id, "Failed to read response body: {}", e);
            Bytes::new()
        }
    };

    let latency = start.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        body_bytes = bytes.len(),
        "← Response"
    );
    tracing::debug!(
        request_id = %request_id,
        body = %preview(&bytes, 2000),
        "Response body"
    );

    Response::from_parts(parts, Body::from(bytes))
}

/// Lossy, truncated body preview for debug logging
fn preview(bytes: &[u8], max_len: usize) -> String {
    let body = String::from_utf8_lossy(bytes);
    let body = body.trim();
    if body.len() <= max_len {
        body.to_string()
    } else {
        let mut end = max_len;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}...[truncated, {} bytes total]",
            &body[..end],
            body.len()
        )
    }
}
