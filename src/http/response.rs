//! HTTP response building module
//!
//! Every response is JSON and carries the configured `Server` header.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_TYPE, LOCATION, SERVER};
use hyper::{Method, Response, StatusCode};
use serde_json::{json, Value};

const JSON: &str = "application/json";

/// Serialize `body` and build a JSON response
pub fn build_json_response(
    status: StatusCode,
    body: &Value,
    server_name: &str,
) -> Response<Full<Bytes>> {
    build_raw_json_response(status, Bytes::from(body.to_string()), server_name)
}

/// Build a JSON response from an already-serialized body
pub fn build_raw_json_response(
    status: StatusCode,
    body: Bytes,
    server_name: &str,
) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, JSON)
        .header(SERVER, server_name)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback(status)
        })
}

/// `{"detail": ...}` error response
pub fn build_detail_response(
    status: StatusCode,
    detail: Value,
    server_name: &str,
) -> Response<Full<Bytes>> {
    build_json_response(status, &json!({ "detail": detail }), server_name)
}

/// Build 405 Method Not Allowed response with the methods the path accepts
pub fn build_405_response(allowed: &[Method], server_name: &str) -> Response<Full<Bytes>> {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(CONTENT_TYPE, JSON)
        .header(SERVER, server_name)
        .header(ALLOW, allow)
        .body(Full::new(Bytes::from(
            json!({ "detail": "Method Not Allowed" }).to_string(),
        )))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::METHOD_NOT_ALLOWED, &e);
            fallback(StatusCode::METHOD_NOT_ALLOWED)
        })
}

/// Build 307 redirect response, preserving the request method
pub fn build_redirect_response(target: &str, server_name: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::TEMPORARY_REDIRECT)
        .header(LOCATION, target)
        .header(SERVER, server_name)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::TEMPORARY_REDIRECT, &e);
            fallback(StatusCode::TEMPORARY_REDIRECT)
        })
}

/// Drop the body of a response to a `HEAD` request, keeping its headers
pub fn strip_body(response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Full::new(Bytes::new()))
}

fn fallback(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_response_headers() {
        let response = build_json_response(StatusCode::OK, &json!({"a": 1}), "Tour/1.0");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], JSON);
        assert_eq!(response.headers()[SERVER], "Tour/1.0");
        assert_eq!(body_json(response).await, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_405_lists_allowed_methods() {
        let response = build_405_response(&[Method::GET, Method::PUT], "Tour/1.0");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, PUT");
        assert_eq!(body_json(response).await, json!({"detail": "Method Not Allowed"}));
    }

    #[test]
    fn test_redirect() {
        let response = build_redirect_response("/items/?q=1", "Tour/1.0");
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[LOCATION], "/items/?q=1");
    }

    #[tokio::test]
    async fn test_strip_body_keeps_headers() {
        let response = strip_body(build_json_response(StatusCode::OK, &json!({}), "Tour/1.0"));
        assert_eq!(response.headers()[SERVER], "Tour/1.0");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }
}
