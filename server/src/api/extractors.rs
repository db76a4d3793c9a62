//! Path, client and validation extractors for API routes
//!
//! All rejections render the shared JSON error body with status 400.

use std::ops::Deref;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::StatusCode;
use axum::http::header::{HOST, USER_AGENT};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::domain::ClientInfo;

/// Single `{id}` path parameter parsed as a UUID
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub Uuid);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;
        Uuid::parse_str(&raw)
            .map(Self)
            .map_err(|_| ValidationRejection::InvalidId)
    }
}

/// User agent and host of the caller; never rejects
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name| parts.headers.get(name).and_then(|v| v.to_str().ok());
        Ok(ClientInfo::new(header(USER_AGENT), header(HOST)))
    }
}

/// Request validation error
#[derive(Debug)]
pub enum ValidationRejection {
    /// Failed to parse path parameters
    Path(PathRejection),
    /// Path id is not a UUID
    InvalidId,
    /// Failed to parse query string
    Query(QueryRejection),
    /// Failed to parse JSON body
    Json(JsonRejection),
    /// Validation constraints not satisfied
    Validation(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            Self::Path(rejection) => ("PATH_PARSE_ERROR", rejection.body_text()),
            Self::InvalidId => ("INVALID_ID", "Invalid id: must be a UUID".to_string()),
            Self::Query(rejection) => ("QUERY_PARSE_ERROR", rejection.body_text()),
            Self::Json(rejection) => ("JSON_PARSE_ERROR", rejection.body_text()),
            Self::Validation(errors) => ("VALIDATION_ERROR", format_validation_errors(&errors)),
        };
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "bad_request",
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Query extractor with automatic validation.
///
/// Deserializes query parameters and validates them using the `validator` crate.
/// Returns a `ValidationRejection` on parse or validation failure.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T> Deref for ValidatedQuery<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Query)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}

/// JSON body extractor with automatic validation.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::routing::{get, post};
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;
    use crate::api::types::PageQuery;

    #[derive(Debug, Deserialize, Validate)]
    struct Body1 {
        #[validate(length(min = 3, message = "name too short"))]
        name: String,
    }

    fn app() -> Router {
        Router::new()
            .route("/items/{id}", get(|IdPath(id): IdPath| async move { id.to_string() }))
            .route(
                "/pages",
                get(|ValidatedQuery(q): ValidatedQuery<PageQuery>| async move {
                    format!("{}:{}", q.page, q.page_size)
                }),
            )
            .route(
                "/named",
                post(|ValidatedJson(b): ValidatedJson<Body1>| async move { b.name }),
            )
            .route(
                "/client",
                get(|client: ClientInfo| async move { format!("{}|{}", client.user_agent, client.host) }),
            )
    }

    async fn call(request: axum::http::Request<Body>) -> (StatusCode, String) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get_req(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_id_path() {
        let id = Uuid::new_v4();
        let (status, body) = call(get_req(&format!("/items/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, id.to_string());

        let (status, body) = call(get_req("/items/nope")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("INVALID_ID"));
    }

    #[tokio::test]
    async fn test_page_query_defaults_and_bounds() {
        assert_eq!(call(get_req("/pages")).await, (StatusCode::OK, "1:50".into()));
        assert_eq!(
            call(get_req("/pages?page=2&page_size=500")).await,
            (StatusCode::OK, "2:500".into())
        );

        let (status, body) = call(get_req("/pages?page_size=501")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("VALIDATION_ERROR"));

        let (status, _) = call(get_req("/pages?page=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(get_req("/pages?page=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("QUERY_PARSE_ERROR"));
    }

    #[tokio::test]
    async fn test_validated_json() {
        let request = |json: &str| {
            axum::http::Request::post("/named")
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap()
        };
        assert_eq!(
            call(request(r#"{"name":"alice"}"#)).await,
            (StatusCode::OK, "alice".into())
        );

        let (status, body) = call(request(r#"{"name":"al"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("name too short"));

        let (status, body) = call(request("{")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("JSON_PARSE_ERROR"));
    }

    #[tokio::test]
    async fn test_client_info_headers() {
        let request = axum::http::Request::get("/client")
            .header("user-agent", "curl/8.0")
            .header("host", "cinema.local")
            .body(Body::empty())
            .unwrap();
        assert_eq!(call(request).await, (StatusCode::OK, "curl/8.0|cinema.local".into()));
        assert_eq!(call(get_req("/client")).await, (StatusCode::OK, "|".into()));
    }
}
