//! Rate limiting middleware for API routes

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::data::cache::{RateLimitBucket, RateLimitResult, RateLimiter};
use crate::utils::crypto::constant_time_eq;

const BYPASS_HEADER: &str = "X-RateLimit-Bypass";

/// Rate limit middleware state
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
    pub bucket: RateLimitBucket,
    pub key_extractor: KeyExtractor,
    pub bypass_header: Option<String>,
}

/// How to extract rate limit key from request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExtractor {
    /// Socket peer address
    PeerAddress,
    /// First `X-Forwarded-For` entry, falling back to the peer address
    ForwardedFor,
}

impl KeyExtractor {
    pub fn from_config(per_ip: bool) -> Self {
        if per_ip {
            Self::ForwardedFor
        } else {
            Self::PeerAddress
        }
    }
}

/// Rate limit exceeded response
pub struct RateLimitExceeded(RateLimitResult);

impl IntoResponse for RateLimitExceeded {
    fn into_response(self) -> Response {
        let r = &self.0;
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "too_many_requests",
                "code": "RATE_LIMITED",
                "message": "Rate limit exceeded"
            })),
        )
            .into_response();

        add_rate_limit_headers(response.headers_mut(), r);
        if let Ok(v) = HeaderValue::from_str(&r.retry_after.unwrap_or(60).to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, v);
        }
        response
    }
}

/// Add rate limit headers to response
fn add_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    for (name, value) in [
        ("X-RateLimit-Limit", result.limit.to_string()),
        ("X-RateLimit-Remaining", result.remaining.to_string()),
        ("X-RateLimit-Reset", result.reset_at.to_string()),
    ] {
        if let Ok(v) = HeaderValue::from_str(&value) {
            headers.insert(name, v);
        }
    }
}

/// Extract rate limit key based on configuration
fn extract_key(headers: &HeaderMap, key_extractor: KeyExtractor, addr: SocketAddr) -> String {
    match key_extractor {
        KeyExtractor::PeerAddress => addr.ip().to_string(),
        KeyExtractor::ForwardedFor => headers
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| addr.ip().to_string()),
    }
}

/// Rate limiting middleware function
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitExceeded> {
    // Internal callers present the shared secret
    if let Some(ref bypass_secret) = state.bypass_header
        && let Some(header_val) = request.headers().get(BYPASS_HEADER)
        && let Ok(value) = header_val.to_str()
        && constant_time_eq(value, bypass_secret)
    {
        tracing::trace!("Rate limit bypassed via header");
        return Ok(next.run(request).await);
    }

    let key = extract_key(request.headers(), state.key_extractor, addr);
    let result = state.limiter.check(&state.bucket, &key).await;

    if !result.allowed {
        tracing::debug!(bucket = state.bucket.name, %key, "Rate limit exceeded");
        return Err(RateLimitExceeded(result));
    }

    let mut response = next.run(request).await;
    add_rate_limit_headers(response.headers_mut(), &result);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;
    use crate::data::cache::tests::memory_cache;

    fn addr() -> SocketAddr {
        "10.0.0.1:5000".parse().unwrap()
    }

    #[test]
    fn test_extract_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_key(&headers, KeyExtractor::ForwardedFor, addr()), "10.0.0.1");

        headers.insert("X-Forwarded-For", HeaderValue::from_static("1.2.3.4, 10.0.0.9"));
        assert_eq!(extract_key(&headers, KeyExtractor::ForwardedFor, addr()), "1.2.3.4");
        assert_eq!(extract_key(&headers, KeyExtractor::PeerAddress, addr()), "10.0.0.1");
    }

    #[test]
    fn test_rate_limit_exceeded_response() {
        let result = RateLimitResult {
            allowed: false,
            remaining: 0,
            limit: 100,
            reset_at: 1705593600,
            retry_after: Some(45),
        };
        let response = RateLimitExceeded(result).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "45");
        assert_eq!(response.headers()["X-RateLimit-Limit"], "100");
    }

    async fn limited_app(rpm: u32, bypass: Option<&str>) -> Router {
        let state = RateLimitState {
            limiter: Arc::new(RateLimiter::new(memory_cache().await)),
            bucket: RateLimitBucket::auth(rpm),
            key_extractor: KeyExtractor::PeerAddress,
            bypass_header: bypass.map(String::from),
        };
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(from_fn_with_state(state, rate_limit_middleware))
            .layer(MockConnectInfo(addr()))
    }

    #[tokio::test]
    async fn test_middleware_blocks_after_limit() {
        let app = limited_app(2, None).await;
        let mut statuses = Vec::new();
        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(Request::get("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            statuses.push(response.status());
        }
        assert_eq!(statuses[0], StatusCode::OK);
        assert_eq!(statuses[4], StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_bypass_header() {
        let app = limited_app(1, Some("letmein")).await;
        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(
                    Request::get("/")
                        .header(BYPASS_HEADER, "letmein")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
