//! Error types of the exporter.

use core::error::Error;

use derive_more::Display;
use error_stack::Report;

/// Result type for collection and exposition.
pub type CollectResult<T> = Result<T, Report<CollectError>>;

/// Errors that abort a collection cycle or its exposition.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum CollectError {
    #[display("Could not list zones")]
    ZoneListing,

    #[display("Could not retrieve details of zone {zone}")]
    ZoneExpansion { zone: String },

    #[display("Could not fetch {what}")]
    Fetch { what: String },

    #[display("Could not schedule collection task")]
    Scheduler,

    #[display("{failed} of {total} collection tasks failed")]
    TasksFailed { failed: usize, total: usize },

    #[display("Could not register metric family {name}")]
    Registration { name: String },

    #[display("Metric family {name} is not registered")]
    UnregisteredFamily { name: String },

    #[display("Series does not match the labels of metric family {name}")]
    SeriesMismatch { name: String },

    #[display("Could not encode metrics")]
    Encoding,
}

impl Error for CollectError {}

/// Errors raised while validating the configuration.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum ConfigError {
    #[display("Missing {flag}")]
    Missing { flag: &'static str },

    #[display("Invalid {flag}: {reason}")]
    Invalid { flag: &'static str, reason: String },
}

impl Error for ConfigError {}
