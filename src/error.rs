//! Error types for the cache server
//!
//! Provides unified error handling using thiserror. Page-facing failures answer
//! with a plain text body; admin failures answer with a JSON `{error}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::render::RenderError;

/// Body of every generic 500.
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

// == App Error Enum ==
/// Unified error type for the cache server.
#[derive(Error, Debug)]
pub enum AppError {
    /// The renderer failed for the given URL
    #[error("render failed for {url}: {source}")]
    RenderFailure {
        url: String,
        #[source]
        source: RenderError,
    },

    /// The data endpoint document could not be read
    #[error("document unavailable: {0}")]
    MissingDocument(String),

    /// No renderer owns the route
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or wrong admin credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn render_failure(url: impl Into<String>, source: RenderError) -> Self {
        Self::RenderFailure {
            url: url.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RenderFailure { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::MissingDocument(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            AppError::RenderFailure { .. } | AppError::Internal(_) => {
                (status, INTERNAL_ERROR_BODY).into_response()
            }
            AppError::MissingDocument(_) => (status, "Document not found").into_response(),
            AppError::NotFound(_) => (status, "Not Found").into_response(),
            AppError::Unauthorized(msg) => (status, Json(json!({ "error": msg }))).into_response(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_render_failure_is_generic_500() {
        let err = AppError::render_failure("/boom", RenderError::Failed("secret detail".into()));
        assert!(err.to_string().contains("/boom"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, INTERNAL_ERROR_BODY);
    }

    #[tokio::test]
    async fn test_missing_document_is_plain_404() {
        let response = AppError::MissingDocument("dummy.md".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Document not found");
    }

    #[tokio::test]
    async fn test_unauthorized_is_json() {
        let response = AppError::Unauthorized("invalid admin token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "invalid admin token");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound("/x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::MissingDocument("dummy.md".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("oops".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
