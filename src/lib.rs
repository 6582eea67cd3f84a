//! SSR Cache - a caching front door for a server-side rendering backend
//!
//! Serves rendered pages from a bounded TTL/LRU cache, renders on a miss and
//! emits per-route cache-control headers for the edge CDN.

pub mod api;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod memory;
pub mod models;
pub mod render;
pub mod tasks;
pub mod telemetry;

pub use api::{create_router, AppState};
pub use config::Config;
pub use dispatch::Dispatcher;
pub use tasks::spawn_cleanup_task;
