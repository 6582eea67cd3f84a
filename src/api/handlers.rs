//! API Handlers
//!
//! HTTP request handlers for the page, data and admin endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, Uri},
    response::Response,
    Extension, Json,
};
use bytes::Bytes;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::cache::{CacheStats, CacheStore, PolicyTable};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{AppError, Result};
use crate::memory;
use crate::models::{ClearResponse, StatsResponse};
use crate::render::{PageRenderer, RenderRequest};

use super::middleware::OriginalUrl;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache pipeline shared by the page and data endpoints
    pub dispatcher: Arc<Dispatcher>,
    /// Root of the static asset tree
    pub static_dir: Arc<PathBuf>,
    /// Bearer token required by cache-clear, if any
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Creates a new AppState around a dispatcher.
    pub fn new(dispatcher: Dispatcher, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            static_dir: Arc::new(static_dir.into()),
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.map(Arc::from);
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Initializes the store, counters and dispatcher with the default policy
    /// table.
    pub fn from_config(config: &Config, renderer: Arc<dyn PageRenderer>) -> Self {
        Self::from_config_with_policies(config, renderer, PolicyTable::default())
    }

    /// Like [`AppState::from_config`] with a custom policy table.
    pub fn from_config_with_policies(
        config: &Config,
        renderer: Arc<dyn PageRenderer>,
        policies: PolicyTable,
    ) -> Self {
        let store = Arc::new(CacheStore::new(config.max_entries, config.ttl()));
        let stats = Arc::new(CacheStats::new());
        let dispatcher = Dispatcher::new(store, stats, renderer, config.document_path.clone())
            .with_policies(policies);

        Self::new(dispatcher, config.static_dir.clone()).with_admin_token(config.admin_token.clone())
    }

    pub fn store(&self) -> Arc<CacheStore> {
        Arc::clone(self.dispatcher.store())
    }

    /// Rejects the request unless it carries the configured admin token.
    fn authorize(&self, headers: &HeaderMap) -> Result<()> {
        let Some(expected) = self.admin_token.as_deref() else {
            return Ok(());
        };

        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("missing admin token".to_string()))?;

        if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
            Ok(())
        } else {
            warn!("Rejected cache clear with invalid admin token");
            Err(AppError::Unauthorized("invalid admin token".to_string()))
        }
    }
}

/// Original URL recorded by the outer middleware, or the URI as routed.
fn original_url(captured: Option<Extension<OriginalUrl>>, uri: &Uri) -> String {
    match captured {
        Some(Extension(OriginalUrl(url))) => url,
        None => uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
    }
}

/// Catch-all page handler
///
/// Serves rendered pages through the cache.
pub async fn page_handler(
    State(state): State<AppState>,
    captured: Option<Extension<OriginalUrl>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let request = RenderRequest {
        method,
        original_url: original_url(captured, &uri),
        headers,
        body,
    };

    state.dispatcher.serve_page(request).await
}

/// Handler for GET /api/test
///
/// Serves the transformed markdown document as JSON `{html}`.
pub async fn document_handler(
    State(state): State<AppState>,
    captured: Option<Extension<OriginalUrl>>,
    uri: Uri,
) -> Result<Response> {
    let url = original_url(captured, &uri);
    state.dispatcher.serve_document(&url).await
}

/// Handler for GET /api/cache-stats
///
/// Returns counters, cache size and process memory usage.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let store = state.dispatcher.store();
    let snapshot = state.dispatcher.stats().snapshot();

    Json(StatsResponse::new(
        snapshot,
        store.len(),
        memory::sample(store),
    ))
}

/// Handler for POST /api/cache-clear
///
/// Flushes every cached page and zeroes the counters.
pub async fn clear_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ClearResponse>> {
    state.authorize(&headers)?;

    let flushed = state.dispatcher.clear();
    Ok(Json(ClearResponse::cleared(flushed)))
}
