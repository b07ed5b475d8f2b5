//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: serves the OpenAPI document,
//! enforces the body size limit, runs the dispatcher and maps its outcome to
//! a JSON response.

use crate::config::AppState;
use crate::dispatch::{DispatchError, Outcome, RequestParts};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::{Method, Request, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let server_name = state.config.http.server_name.as_str();
    let is_head = parts.method == Method::HEAD;

    let mut entry = state.config.logging.access_log.then(|| {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            parts.method.to_string(),
            parts.uri.path().to_string(),
        );
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.http_version = version_label(parts.version).to_string();
        entry.referer = header_text(&parts.headers, REFERER);
        entry.user_agent = header_text(&parts.headers, USER_AGENT);
        entry
    });

    let response = if is_openapi_request(&state, &parts.method, parts.uri.path()) {
        http::build_raw_json_response(StatusCode::OK, state.openapi.clone(), server_name)
    } else {
        match read_body(body, &parts.headers, state.config.http.max_body_size).await {
            Ok(body) => {
                let request = RequestParts {
                    method: parts.method,
                    path: parts.uri.path().to_string(),
                    query: parts.uri.query().map(ToString::to_string),
                    headers: parts.headers,
                    body,
                };
                respond(state.dispatcher.dispatch(&request), server_name)
            }
            Err(e) => respond(Err(e), server_name),
        }
    };

    let response = if is_head {
        http::strip_body(response)
    } else {
        response
    };

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn is_openapi_request(state: &AppState, method: &Method, path: &str) -> bool {
    state.config.api.openapi_enabled
        && path == state.config.api.openapi_url
        && (method == Method::GET || method == Method::HEAD)
}

/// Collect the request body, refusing anything over `limit` bytes
async fn read_body<B>(
    body: B,
    headers: &hyper::HeaderMap,
    limit: u64,
) -> Result<Bytes, DispatchError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(DispatchError::PayloadTooLarge { limit });
    }

    let limit_bytes = usize::try_from(limit).unwrap_or(usize::MAX);
    match Limited::new(body, limit_bytes).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(DispatchError::PayloadTooLarge { limit })
        }
        Err(e) => Err(DispatchError::BadRequest(e.to_string())),
    }
}

fn respond(result: Result<Outcome, DispatchError>, server_name: &str) -> Response<Full<Bytes>> {
    match result {
        Ok(Outcome::Reply(payload)) => {
            http::build_json_response(StatusCode::OK, &payload, server_name)
        }
        Ok(Outcome::Redirect(target)) => http::build_redirect_response(&target, server_name),
        Err(DispatchError::MethodNotAllowed { allowed }) => {
            http::build_405_response(&allowed, server_name)
        }
        Err(e) => {
            match &e {
                DispatchError::Internal(_) => logger::log_error(&e.to_string()),
                DispatchError::BadRequest(_) => logger::log_warning(&e.to_string()),
                _ => {}
            }
            http::build_detail_response(e.status(), e.detail(), server_name)
        }
    }
}

fn header_text(headers: &hyper::HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use hyper::header::{ALLOW, CONTENT_TYPE, LOCATION, SERVER};
    use serde_json::{json, Value};

    fn state_with(adjust: impl FnOnce(&mut Config)) -> Arc<AppState> {
        let mut config = Config::load_from("does-not-exist/endpoint-tour").unwrap();
        config.logging.access_log = false;
        adjust(&mut config);
        Arc::new(AppState::new(config).unwrap())
    }

    fn state() -> Arc<AppState> {
        state_with(|_| {})
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn send(state: Arc<AppState>, req: Request<Full<Bytes>>) -> (StatusCode, Response<Full<Bytes>>) {
        let response = handle_request(req, state, peer()).await.unwrap();
        (response.status(), response)
    }

    async fn json_body(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_returns_json_with_server_header() {
        let (status, response) = send(state(), request(Method::GET, "/", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.headers()[SERVER], "endpoint-tour");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(json_body(response).await, json!({"message": "Hello World"}));
    }

    #[tokio::test]
    async fn test_validation_errors_are_422() {
        let (status, response) = send(state(), request(Method::GET, "/items/?q=ab", "")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["detail"][0]["type"], "string_too_short");
        assert_eq!(body["detail"][0]["loc"], json!(["query", "q"]));
        assert_eq!(body["detail"][0]["ctx"]["min_length"], 3);
    }

    #[tokio::test]
    async fn test_create_item_over_http() {
        let (status, response) = send(
            state(),
            request(Method::POST, "/items/", r#"{"name":"Foo","price":2,"tax":0.5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(response).await["price_with_tax"], json!(2.5));
    }

    #[tokio::test]
    async fn test_invalid_json_is_422() {
        let (status, response) =
            send(state(), request(Method::POST, "/items/", r#"{"name": }"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["detail"][0]["type"], "json_invalid");
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let (status, response) = send(state(), request(Method::GET, "/nowhere", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({"detail": "Not Found"}));

        let (status, response) = send(state(), request(Method::DELETE, "/items/", "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, POST");
        assert_eq!(json_body(response).await, json!({"detail": "Method Not Allowed"}));
    }

    #[tokio::test]
    async fn test_trailing_slash_redirect_keeps_query() {
        let (status, response) = send(state(), request(Method::GET, "/items?q=abc", "")).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[LOCATION], "/items/?q=abc");
    }

    #[tokio::test]
    async fn test_head_has_headers_but_no_body() {
        let (status, response) = send(state(), request(Method::HEAD, "/user", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.headers()[SERVER], "endpoint-tour");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_body_limit() {
        let state = state_with(|config| config.http.max_body_size = 16);
        let (status, response) = send(
            state,
            request(Method::POST, "/items/", r#"{"name":"Foo","price":35.4}"#),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(response).await, json!({"detail": "Payload Too Large"}));
    }

    #[tokio::test]
    async fn test_declared_length_over_limit() {
        let state = state_with(|config| config.http.max_body_size = 4);
        let mut req = request(Method::POST, "/items/", "");
        req.headers_mut().insert(CONTENT_LENGTH, "1024".parse().unwrap());
        let (status, _) = send(state, req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (status, response) = send(state(), request(Method::GET, "/openapi.json", "")).await;
        assert_eq!(status, StatusCode::OK);
        let doc = json_body(response).await;
        assert_eq!(doc["openapi"], "3.1.0");
        assert!(doc["paths"]["/extra_data/{item_id}"]["put"].is_object());
    }

    #[tokio::test]
    async fn test_openapi_can_be_disabled() {
        let state = state_with(|config| config.api.openapi_enabled = false);
        let (status, _) = send(state, request(Method::GET, "/openapi.json", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_version_label() {
        assert_eq!(version_label(Version::HTTP_10), "1.0");
        assert_eq!(version_label(Version::HTTP_11), "1.1");
        assert_eq!(version_label(Version::HTTP_2), "2");
    }
}
