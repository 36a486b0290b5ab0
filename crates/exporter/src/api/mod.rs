//! HTTP exposition of the collected metrics
//!
//! # Endpoints
//!
//! - `GET <telemetry-path>` (default `/metrics`) - runs a collection cycle and
//!   returns its snapshot in the Prometheus text format
//! - `GET /` - landing page linking to the metrics

mod errors;
pub mod handlers;
pub mod server;

pub use errors::ApiError;
pub use server::ApiServer;
