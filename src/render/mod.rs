//! Render Module
//!
//! The page renderer contract the dispatcher calls on a cache miss, plus the
//! two renderers this server ships: an upstream HTTP renderer and the markdown
//! document transformer behind the data endpoint.

mod document;
mod upstream;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, Method, StatusCode};
use bytes::Bytes;
use thiserror::Error;

pub use document::DocumentTransformer;
pub use upstream::UpstreamRenderer;

use crate::cache::HTML_CONTENT_TYPE;

// == Render Error ==
/// Failure raised by a renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The rendering backend could not be reached or did not answer in time
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    /// The backend answered but the body could not be read
    #[error("invalid render output: {0}")]
    InvalidOutput(String),

    /// Any other render failure
    #[error("render failed: {0}")]
    Failed(String),
}

// == Render Request ==
/// What the renderer sees of an inbound request.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub method: Method,
    /// Path and query exactly as first received
    pub original_url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RenderRequest {
    pub fn new(method: Method, original_url: impl Into<String>) -> Self {
        Self {
            method,
            original_url: original_url.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Shorthand for a bodiless `GET`.
    pub fn get(original_url: impl Into<String>) -> Self {
        Self::new(Method::GET, original_url)
    }
}

// == Rendered Page ==
/// A renderer's answer: status, headers and a text body.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RenderedPage {
    /// A `200 OK` HTML page with no extra headers.
    pub fn html(body: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static(HTML_CONTENT_TYPE),
        );
        Self {
            status: StatusCode::OK,
            headers,
            body: body.into(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// The page's `Content-Type`, defaulting to HTML.
    pub fn content_type(&self) -> &str {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(HTML_CONTENT_TYPE)
    }
}

// == Page Renderer ==
/// Turns a request into a rendered page.
///
/// `Ok(None)` means the renderer does not own the route and the request should
/// fall through to a not-found response.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn handle(&self, request: &RenderRequest) -> Result<Option<RenderedPage>, RenderError>;
}
