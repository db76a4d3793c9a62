//! Shared API types
//!
//! Common types used across all API endpoints including error handling
//! and pagination.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::api::auth::JwtError;
use crate::core::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE, MAX_PAGE_SIZE};
use crate::data::oauth::OAuthError;
use crate::data::search::SearchError;
use crate::domain::{AccessError, CatalogError, Pagination};

/// Validator function for page parameter
pub fn validate_page(page: u32) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::new("page_min").with_message("Page must be >= 1".into()));
    }
    if page > MAX_PAGE {
        return Err(ValidationError::new("page_max")
            .with_message(format!("Page must be <= {}", MAX_PAGE).into()));
    }
    Ok(())
}

/// Validator function for page_size parameter
pub fn validate_page_size(page_size: u32) -> Result<(), ValidationError> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::new("page_size_range")
            .with_message(format!("Page size must be between 1 and {}", MAX_PAGE_SIZE).into()));
    }
    Ok(())
}

pub fn default_page() -> u32 {
    DEFAULT_PAGE
}

pub fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// `page` and `page_size` query parameters
#[derive(Debug, Clone, Copy, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, starting at 1
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    /// Items per page
    #[serde(default = "default_page_size")]
    #[validate(custom(function = "validate_page_size"))]
    pub page_size: u32,
}

impl From<PageQuery> for Pagination {
    fn from(q: PageQuery) -> Self {
        Pagination::new(q.page, q.page_size)
    }
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    Unauthorized { code: String, message: String },
    Forbidden { code: String, message: String },
    ServiceUnavailable { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Forbidden {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(what) => {
                Self::not_found("NOT_FOUND", format!("{} not found", what))
            }
            CatalogError::InvalidSort(field) => {
                Self::bad_request("INVALID_SORT", format!("Cannot sort by: {}", field))
            }
            CatalogError::Search(SearchError::Transport(e)) => {
                tracing::error!(error = %e, "Search backend unreachable");
                Self::service_unavailable("Search backend unavailable")
            }
            other => {
                tracing::error!(error = %other, "Catalog query failed");
                Self::internal("Catalog query failed")
            }
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::InvalidCredentials => {
                Self::unauthorized("INVALID_CREDENTIALS", "Invalid login or password")
            }
            AccessError::Token(JwtError::Encode(e)) => {
                tracing::error!(error = %e, "Token signing failed");
                Self::internal("Auth operation failed")
            }
            AccessError::Token(e) => {
                tracing::debug!(error = %e, "Token rejected");
                Self::unauthorized("INVALID_TOKEN", e.to_string())
            }
            AccessError::UnknownSubject => {
                Self::unauthorized("INVALID_TOKEN", "Token subject no longer exists")
            }
            AccessError::NotWhitelisted => {
                Self::forbidden("SESSION_REVOKED", "Refresh token is no longer valid")
            }
            AccessError::BadRequest { code, message } => Self::bad_request(code, message),
            AccessError::NotFound(what) => {
                Self::not_found("NOT_FOUND", format!("{} not found", what))
            }
            AccessError::Social(OAuthError::Rejected(reason)) => {
                tracing::debug!(%reason, "Authorization code rejected");
                Self::bad_request("INVALID_CODE", "Authorization code rejected")
            }
            AccessError::Social(e) => {
                tracing::error!(error = %e, "Social login provider failed");
                Self::service_unavailable("Social login provider unavailable")
            }
            other => {
                tracing::error!(error = %other, "Auth operation failed");
                Self::internal("Auth operation failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, "unauthorized", code, message)
            }
            Self::Forbidden { code, message } => {
                (StatusCode::FORBIDDEN, "forbidden", code, message)
            }
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "SERVICE_UNAVAILABLE".to_string(),
                message,
            ),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

/// Pagination metadata in response
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: Pagination, total_items: u64) -> Self {
        Self {
            page: page.page,
            page_size: page.page_size,
            total_items,
            total_pages: total_items.div_ceil(u64::from(page.page_size.max(1))),
        }
    }
}

/// Generic paginated response wrapper
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: Pagination, total_items: u64) -> Self {
        Self {
            data,
            meta: PaginationMeta::new(page, total_items),
        }
    }
}
