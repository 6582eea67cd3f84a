//! API Module
//!
//! HTTP handlers, middleware and routing for the SSR cache front door.
//!
//! # Endpoints
//! - `GET /api/test` - Cached transformed document
//! - `GET /api/cache-stats` - Cache statistics
//! - `POST /api/cache-clear` - Flush the cache and reset statistics
//! - everything else - Static assets, then cached SSR pages

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use middleware::OriginalUrl;
pub use routes::create_router;
