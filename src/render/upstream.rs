//! Upstream HTTP renderer.
//!
//! Forwards a request to the SSR backend and returns its answer as a
//! [`RenderedPage`]. A `404` from the backend means the route is not owned.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use tracing::debug;

use super::{PageRenderer, RenderError, RenderRequest, RenderedPage};

/// Headers that describe a single connection hop and must not be relayed.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Renderer backed by an HTTP SSR server.
#[derive(Debug, Clone)]
pub struct UpstreamRenderer {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamRenderer {
    /// Creates a renderer for `base_url` (e.g. `http://127.0.0.1:4200`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RenderError> {
        // Redirects belong to the browser; following them here would cache the
        // target page under the original URL.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| RenderError::Upstream(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, original_url: &str) -> String {
        format!("{}{}", self.base_url, original_url)
    }
}

#[async_trait]
impl PageRenderer for UpstreamRenderer {
    async fn handle(&self, request: &RenderRequest) -> Result<Option<RenderedPage>, RenderError> {
        let url = self.url_for(&request.original_url);

        let response = self
            .client
            .request(request.method.clone(), url.as_str())
            .headers(request_headers(&request.headers))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|err| RenderError::Upstream(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(url = %url, "Upstream does not own route");
            return Ok(None);
        }

        let headers = response_headers(response.headers());
        let body = response
            .text()
            .await
            .map_err(|err| RenderError::InvalidOutput(err.to_string()))?;

        Ok(Some(RenderedPage {
            status,
            headers,
            body,
        }))
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// End-to-end request headers. `host` and `content-length` are recomputed by
/// the client; `accept-encoding` is dropped so the body arrives as plain text.
fn request_headers(incoming: &HeaderMap) -> HeaderMap {
    incoming
        .iter()
        .filter(|(name, _)| {
            !is_hop_by_hop(name)
                && !matches!(name.as_str(), "host" | "content-length" | "accept-encoding")
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// End-to-end response headers, minus the framing the body no longer matches.
fn response_headers(upstream: &HeaderMap) -> HeaderMap {
    upstream
        .iter()
        .filter(|(name, _)| {
            !is_hop_by_hop(name) && !matches!(name.as_str(), "content-length" | "content-encoding")
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, HeaderValue, Method},
        response::{Html, Redirect},
        routing::{get, post},
        Router,
    };
    use tokio::net::TcpListener;

    async fn spawn_upstream() -> String {
        let app = Router::new()
            .route(
                "/hello",
                get(|| async {
                    (
                        [
                            (header::CACHE_CONTROL, "no-store"),
                            (HeaderName::from_static("x-rendered-by"), "upstream"),
                        ],
                        Html("<h1>hello</h1>"),
                    )
                }),
            )
            .route("/echo", post(|body: String| async move { format!("echo:{body}") }))
            .route(
                "/broken",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "broken") }),
            )
            .route("/old", get(|| async { Redirect::temporary("/new") }))
            .route("/new", get(|| async { Html("target page") }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }

    fn renderer(base_url: &str) -> UpstreamRenderer {
        UpstreamRenderer::new(base_url, Duration::from_secs(5)).unwrap()
    }

    // == Request Mapping ==

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let renderer = renderer("http://localhost:4200/");
        assert_eq!(renderer.base_url(), "http://localhost:4200");
        assert_eq!(renderer.url_for("/a?b=c"), "http://localhost:4200/a?b=c");
    }

    #[test]
    fn test_hop_by_hop_headers_are_not_forwarded() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::HOST, HeaderValue::from_static("example.com"));
        incoming.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        incoming.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        incoming.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en"));

        let forwarded = request_headers(&incoming);

        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[header::ACCEPT_LANGUAGE], "en");
    }

    // == Upstream Responses ==

    #[tokio::test]
    async fn test_renders_page_with_upstream_headers() {
        let base = spawn_upstream().await;
        let page = renderer(&base)
            .handle(&RenderRequest::get("/hello?lang=en"))
            .await
            .unwrap()
            .expect("route is owned");

        assert_eq!(page.status, StatusCode::OK);
        assert_eq!(page.body, "<h1>hello</h1>");
        assert_eq!(page.headers["x-rendered-by"], "upstream");
        assert_eq!(page.headers[header::CACHE_CONTROL], "no-store");
        assert!(page.content_type().starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_forwards_method_and_body() {
        let base = spawn_upstream().await;
        let mut request = RenderRequest::new(Method::POST, "/echo");
        request.body = bytes::Bytes::from_static(b"payload");

        let page = renderer(&base).handle(&request).await.unwrap().unwrap();

        assert_eq!(page.body, "echo:payload");
    }

    #[tokio::test]
    async fn test_upstream_404_means_not_owned() {
        let base = spawn_upstream().await;
        let outcome = renderer(&base)
            .handle(&RenderRequest::get("/nowhere"))
            .await
            .unwrap();

        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_passed_through() {
        let base = spawn_upstream().await;
        let page = renderer(&base)
            .handle(&RenderRequest::get("/broken"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(page.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_redirect_is_relayed_not_followed() {
        let base = spawn_upstream().await;
        let page = renderer(&base)
            .handle(&RenderRequest::get("/old"))
            .await
            .unwrap()
            .expect("route is owned");

        assert_eq!(page.status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(page.headers[header::LOCATION], "/new");
        assert_ne!(page.body, "target page");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_a_render_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = renderer(&format!("http://{addr}"))
            .handle(&RenderRequest::get("/"))
            .await;

        assert!(matches!(result, Err(RenderError::Upstream(_))));
    }
}
