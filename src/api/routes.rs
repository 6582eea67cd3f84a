//! API Routes
//!
//! Configures the Axum router with all endpoints and layers.

use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware::{from_fn, from_fn_with_state},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Span};

use super::handlers::{
    clear_handler, document_handler, page_handler, stats_handler, AppState,
};
use super::middleware::{capture_original_url, serve_static};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/test` - Cached transformed document
/// - `GET /api/cache-stats` - Counters, cache size and memory usage
/// - `POST /api/cache-clear` - Flush the cache and reset counters
/// - anything else - Cached SSR page
///
/// Other methods on the named paths fall through to the page handler.
///
/// # Middleware (outermost first)
/// - Tracing: one completion line per request with the cache counters
/// - Original URL capture
/// - Static assets
pub fn create_router(state: AppState) -> Router {
    let stats = state.dispatcher.stats().clone();

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            info_span!("request", method = %request.method(), url = %request.uri())
        })
        .on_response(move |response: &Response, latency: Duration, _span: &Span| {
            let counters = stats.snapshot();
            info!(
                status = response.status().as_u16(),
                latency_ms = latency.as_millis() as u64,
                hits = counters.hits,
                misses = counters.misses,
                renders = counters.renders,
                "Request completed"
            );
        });

    Router::new()
        .route("/api/test", get(document_handler).fallback(page_handler))
        .route("/api/cache-stats", get(stats_handler).fallback(page_handler))
        .route("/api/cache-clear", post(clear_handler).fallback(page_handler))
        .fallback(page_handler)
        .layer(from_fn_with_state(state.clone(), serve_static))
        .layer(from_fn(capture_original_url))
        .layer(trace)
        .with_state(state)
}
