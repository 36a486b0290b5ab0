//! Ambient helpers shared by the exporter crates: logging setup, version
//! string and the bounded worker pool used to fan out statistics requests.

mod build_info;
pub mod logging;
pub mod version;
pub mod worker_pool;
