use crate::error::ErrorBody;
use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Instant;

/// リクエストごとにメソッド・パス・ステータス・処理時間を 1 行出力する
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_secs_f64() * 1000.0,
        "request completed"
    );

    response
}

/// ハンドラ外で生成されたエラー応答（408, 413, 405 など）を JSON にそろえる
///
/// 既に JSON のボディを持つ応答はそのまま返す。
pub async fn json_error_bodies(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let message = status.canonical_reason().unwrap_or("Request failed");
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);

    (parts, Json(ErrorBody::message(message))).into_response()
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{self, Body},
        http::{self, Method, StatusCode},
        middleware::map_response,
        routing::get,
        Router,
    };
    use std::time::Duration;
    use tower::ServiceExt;
    use tower_http::timeout::TimeoutLayer;

    fn slow_app() -> Router {
        Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    "late"
                }),
            )
            .layer(TimeoutLayer::new(Duration::from_millis(10)))
            .layer(map_response(json_error_bodies))
    }

    async fn call(app: Router, method: Method, uri: &str) -> (Response, serde_json::Value) {
        let request = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = body::to_bytes(body, usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap();
        (Response::from_parts(parts, Body::empty()), json)
    }

    #[tokio::test]
    async fn test_timeout_response_gets_json_message() {
        let (response, json) = call(slow_app(), Method::GET, "/slow").await;

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(json, serde_json::json!({"message": "Request Timeout"}));
    }

    #[tokio::test]
    async fn test_method_not_allowed_keeps_allow_header() {
        let (response, json) = call(slow_app(), Method::POST, "/slow").await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key(header::ALLOW));
        assert_eq!(json["message"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_json_error_body_is_left_alone() {
        let app = Router::new()
            .route(
                "/",
                get(|| async {
                    (StatusCode::BAD_REQUEST, Json(ErrorBody::message("The id is invalid")))
                }),
            )
            .layer(map_response(json_error_bodies));

        let (response, json) = call(app, Method::GET, "/").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json, serde_json::json!({"message": "The id is invalid"}));
    }
}
