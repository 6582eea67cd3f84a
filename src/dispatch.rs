//! Request Dispatcher
//!
//! Runs every cacheable request through the same steps: bypass check, store
//! lookup, render on miss, store write and outbound cache headers. Counters are
//! updated on every cached path and never on a bypassed one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};
use tracing::{debug, error, info};

use crate::cache::{
    path_of, BypassRules, CacheKey, CachePolicy, CacheStats, CacheStore, CachedPage, PolicyTable,
    HTML_CONTENT_TYPE,
};
use crate::error::{AppError, Result};
use crate::models::DocumentResponse;
use crate::render::{DocumentTransformer, PageRenderer, RenderError, RenderRequest, RenderedPage};

/// Header carrying the edge CDN's own max-age.
pub const CDN_CACHE_CONTROL: HeaderName = HeaderName::from_static("cdn-cache-control");

/// Outcome of a store lookup, already counted.
enum Lookup {
    Hit(CachedPage),
    Miss,
}

// == Dispatcher ==
/// Shared request pipeline behind the page and data endpoints.
pub struct Dispatcher {
    store: Arc<CacheStore>,
    stats: Arc<CacheStats>,
    policies: PolicyTable,
    bypass: BypassRules,
    renderer: Arc<dyn PageRenderer>,
    document_path: PathBuf,
    transformer: Arc<DocumentTransformer>,
}

impl Dispatcher {
    /// Creates a dispatcher with the default policy table and bypass rules.
    pub fn new(
        store: Arc<CacheStore>,
        stats: Arc<CacheStats>,
        renderer: Arc<dyn PageRenderer>,
        document_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            stats,
            policies: PolicyTable::default(),
            bypass: BypassRules::default(),
            renderer,
            document_path: document_path.into(),
            transformer: Arc::new(DocumentTransformer::new()),
        }
    }

    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_bypass(mut self, bypass: BypassRules) -> Self {
        self.bypass = bypass;
        self
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn stats(&self) -> &Arc<CacheStats> {
        &self.stats
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    // == Page Endpoint ==
    /// Serves a page from the cache, rendering it on a miss.
    pub async fn serve_page(&self, request: RenderRequest) -> Result<Response> {
        let url = request.original_url.clone();

        if self.bypass.should_bypass(&request.method, path_of(&url)) {
            debug!(url = %url, method = %request.method, "Bypassing cache");
            return self.forward(&request).await;
        }

        let key = CacheKey::for_url(&url);
        let policy = self.policies.resolve(&url);

        if let Lookup::Hit(page) = self.lookup(&key) {
            return hit_response(page, policy);
        }

        // The render and its store write run on their own task so a client
        // that hangs up mid-render still leaves the page cached.
        self.stats.record_render();
        let renderer = Arc::clone(&self.renderer);
        let store = Arc::clone(&self.store);
        let render = tokio::spawn(async move {
            let outcome = renderer.handle(&request).await;
            if let Ok(Some(page)) = &outcome {
                if page.status.is_success() {
                    store.set(
                        key.into_string(),
                        CachedPage::new(page.content_type(), page.body.clone()),
                    );
                }
            }
            outcome
        });

        let page = match render.await.map_err(|err| AppError::Internal(err.to_string()))? {
            Ok(Some(page)) => page,
            Ok(None) => {
                debug!(url = %url, "No renderer owns route");
                return Err(AppError::NotFound(url));
            }
            Err(err) => return Err(render_failed(url, err)),
        };

        miss_response(page, policy)
    }

    /// Hands a bypassed request to the renderer and relays its answer as is.
    async fn forward(&self, request: &RenderRequest) -> Result<Response> {
        match self.renderer.handle(request).await {
            Ok(Some(page)) => Ok(verbatim(page)),
            Ok(None) => Err(AppError::NotFound(request.original_url.clone())),
            Err(err) => Err(render_failed(request.original_url.clone(), err)),
        }
    }

    // == Data Endpoint ==
    /// Serves the transformed markdown document as JSON `{html}`.
    ///
    /// The JSON body itself is cached, so a hit replays it byte for byte.
    pub async fn serve_document(&self, original_url: &str) -> Result<Response> {
        let key = CacheKey::for_url(original_url);
        let policy = self.policies.resolve(original_url);

        if let Lookup::Hit(page) = self.lookup(&key) {
            return hit_response(page, policy);
        }

        let path = self.document_path.clone();
        let transformer = Arc::clone(&self.transformer);
        let stats = Arc::clone(&self.stats);
        let store = Arc::clone(&self.store);
        let url = original_url.to_string();
        let build = tokio::spawn(async move {
            let page = build_document(path, transformer, stats, url).await?;
            store.set(key.into_string(), page.clone());
            Ok::<_, AppError>(page)
        });

        let page = build
            .await
            .map_err(|err| AppError::Internal(err.to_string()))??;

        hit_response(page, policy)
    }

    // == Cache Clear ==
    /// Flushes the store and zeroes the counters as one step.
    ///
    /// Returns the number of entries dropped.
    pub fn clear(&self) -> usize {
        let flushed = self.store.flush_all_with(|| self.stats.reset());
        info!(flushed, "Cache cleared manually");
        flushed
    }

    fn lookup(&self, key: &CacheKey) -> Lookup {
        match self.store.get(key.as_str()) {
            Some(page) => {
                self.stats.record_hit();
                debug!(key = %key, "Cache hit");
                Lookup::Hit(page)
            }
            None => {
                self.stats.record_miss();
                debug!(key = %key, "Cache miss");
                Lookup::Miss
            }
        }
    }
}

/// Reads and transforms the document into its cached JSON form.
///
/// Only a missing file is a 404; a file that exists but cannot be read is a
/// server fault. Invalid UTF-8 is replaced rather than rejected.
async fn build_document(
    path: PathBuf,
    transformer: Arc<DocumentTransformer>,
    stats: Arc<CacheStats>,
    url: String,
) -> Result<CachedPage> {
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            error!(path = %path.display(), error = %err, "Document not found");
            return Err(AppError::MissingDocument(path.display().to_string()));
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "Document unreadable");
            return Err(AppError::Internal(err.to_string()));
        }
    };
    let markdown = String::from_utf8_lossy(&bytes).into_owned();

    stats.record_render();
    let html = tokio::task::spawn_blocking(move || transformer.render(&markdown))
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?
        .map_err(|err| render_failed(url, err))?;

    let body = serde_json::to_string(&DocumentResponse { html })
        .map_err(|err| AppError::Internal(err.to_string()))?;
    Ok(CachedPage::json(body))
}

fn render_failed(url: String, err: RenderError) -> AppError {
    error!(url = %url, error = %err, "Render error");
    AppError::render_failure(url, err)
}

/// Sets the outbound cache headers, replacing any the renderer supplied.
pub fn apply_policy(headers: &mut HeaderMap, policy: CachePolicy) -> Result<()> {
    let cache_control = HeaderValue::try_from(policy.cache_control())
        .map_err(|err| AppError::Internal(err.to_string()))?;
    let cdn_cache_control = HeaderValue::try_from(policy.cdn_cache_control())
        .map_err(|err| AppError::Internal(err.to_string()))?;

    headers.insert(header::CACHE_CONTROL, cache_control);
    headers.insert(CDN_CACHE_CONTROL, cdn_cache_control);
    headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
    Ok(())
}

fn hit_response(page: CachedPage, policy: CachePolicy) -> Result<Response> {
    let content_type = HeaderValue::from_str(&page.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(HTML_CONTENT_TYPE));

    let mut response = Response::new(Body::from(page.body));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    apply_policy(response.headers_mut(), policy)?;
    Ok(response)
}

fn miss_response(page: RenderedPage, policy: CachePolicy) -> Result<Response> {
    let mut headers: HeaderMap = page
        .headers
        .iter()
        .filter(|(name, _)| *name != header::CACHE_CONTROL)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(HTML_CONTENT_TYPE),
        );
    }
    apply_policy(&mut headers, policy)?;

    let mut response = Response::new(Body::from(page.body));
    *response.status_mut() = page.status;
    *response.headers_mut() = headers;
    Ok(response)
}

fn verbatim(page: RenderedPage) -> Response {
    let mut response = Response::new(Body::from(page.body));
    *response.status_mut() = page.status;
    *response.headers_mut() = page.headers;
    response
}
