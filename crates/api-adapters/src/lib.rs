//! # api-adapters
//!
//! The HTTP surface of yamdb. Routing, request extraction and error mapping
//! live behind the `web-axum` feature; the metrics registry is always built.

pub mod metrics;
#[cfg(feature = "web-axum")]
pub mod web;

pub use metrics::ApiMetrics;
#[cfg(feature = "web-axum")]
pub use web::{router, AppState, AuthPorts};
