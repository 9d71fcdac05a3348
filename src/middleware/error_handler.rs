use axum::{
    body::{Body, to_bytes},
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use tracing::error;

/// 日志中保留的响应体上限
const BODY_LOG_LIMIT: usize = 4096;

/// 把 5xx 响应体记入日志后原样返回，其余响应不动
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    if !response.status().is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, BODY_LOG_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "failed to read server error body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    error!(
        status = %parts.status,
        body = %String::from_utf8_lossy(&bytes),
        "server error response"
    );

    // body 已被消费，重建响应时去掉原 Content-Length
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
