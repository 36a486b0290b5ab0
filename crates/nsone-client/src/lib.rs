//! Blocking client for the NSONE statistics API.
//!
//! Every call goes through a shared [`ConnectionLimiter`] that caps the number
//! of in-flight requests, and through a [`RetryingClient`] that retries
//! timeouts and rate limiting with linear backoff. HTTP 404 is reported as
//! [`Lookup::NotFound`] rather than as an error.
//!
//! ```no_run
//! use api_types::StatsPeriod;
//! use nsone_client::{ClientConfig, NsoneClient, StatsApi};
//!
//! # fn main() -> nsone_client::ClientResult<()> {
//! let client = NsoneClient::new(&ClientConfig::new("api-key"))?;
//! for zone in client.zones()? {
//!     println!("{}: {:?}", zone.name, client.zone_qps(&zone.name)?);
//! }
//! let usage = client.account_usage(StatsPeriod::Monthly)?;
//! println!("queries this month: {}", usage.queries);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod limiter;
pub mod transport;

pub use api::NsoneClient;
pub use api::StatsApi;
pub use client::Lookup;
pub use client::RetryingClient;
pub use config::ClientConfig;
pub use config::RetryPolicy;
pub use error::ClientError;
pub use error::ClientResult;
pub use limiter::ConnectionLimiter;
pub use transport::Transport;
