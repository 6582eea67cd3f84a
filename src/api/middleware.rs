//! HTTP Middleware
//!
//! Layers that run before routing: original URL capture and static assets.

use std::path::{Component, Path, PathBuf};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use percent_encoding::percent_decode_str;
use tracing::debug;

use super::handlers::AppState;

/// Extensions whose files are content-hashed and never change in place.
const IMMUTABLE_EXTENSIONS: &[&str] = &[
    "js", "css", "woff", "woff2", "ttf", "eot", "svg", "png", "jpg", "jpeg", "gif", "webp", "ico",
];

const ASSET_CACHE_CONTROL: &str = "public, max-age=31536000";
const IMMUTABLE_ASSET_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Path and query of a request exactly as first received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalUrl(pub String);

impl OriginalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Records the inbound path and query before anything can rewrite them.
pub async fn capture_original_url(mut request: Request, next: Next) -> Response {
    let original = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    debug!(url = %original, "Original URL captured");
    request.extensions_mut().insert(OriginalUrl(original));

    next.run(request).await
}

/// Answers GET and HEAD requests that name a file in the static directory.
///
/// Anything else, including directories and unknown paths, falls through.
pub async fn serve_static(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method();
    if method != Method::GET && method != Method::HEAD {
        return next.run(request).await;
    }

    let Some(path) = asset_path(&state.static_dir, request.uri().path()) else {
        return next.run(request).await;
    };

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return next.run(request).await,
    }

    let contents = match tokio::fs::read(&path).await {
        Ok(contents) => contents,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Static asset unreadable");
            return next.run(request).await;
        }
    };

    let head_only = request.method() == Method::HEAD;
    asset_response(&path, contents, head_only)
}

/// Maps a request path onto a file below `root`.
///
/// The path is percent-decoded first. Rejects directory paths and any `..`,
/// root or prefix component of the decoded path.
fn asset_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let relative = decoded.trim_start_matches('/');
    if relative.is_empty()
        || relative.ends_with('/')
        || relative.contains('\\')
        || relative.contains('\0')
    {
        return None;
    }

    let relative = Path::new(relative);
    let all_normal = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));

    all_normal.then(|| root.join(relative))
}

fn cache_control_for(path: &Path) -> &'static str {
    let immutable = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMMUTABLE_EXTENSIONS
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false);

    if immutable {
        IMMUTABLE_ASSET_CACHE_CONTROL
    } else {
        ASSET_CACHE_CONTROL
    }
}

fn asset_response(path: &Path, contents: Vec<u8>, head_only: bool) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let len = contents.len();

    let body = if head_only {
        Body::empty()
    } else {
        Body::from(contents)
    };
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control_for(path)),
    );

    response
}
