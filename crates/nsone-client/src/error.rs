//! Error types for the NSONE client.

use core::error::Error;

use derive_more::Display;
use error_stack::Report;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, Report<ClientError>>;

/// Errors that can occur while talking to the provider API.
#[derive(Debug, Display)]
pub enum ClientError {
    /// Malformed resource address, e.g. a record without a type
    #[display("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The resource does not exist where the caller requires it to
    #[display("Resource not found: {url}")]
    NotFound { url: String },

    /// Transient failures persisted through every permitted attempt
    #[display("Giving up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Response status outside 200-399
    #[display("Unexpected HTTP status {status}")]
    Status { status: u16 },

    /// Non-timeout transport failure
    #[display("Transport error")]
    Transport,

    /// Response body is not the expected JSON payload
    #[display("Could not decode response")]
    Decode,

    /// Payload decoded but violates an expectation of the caller
    #[display("Unexpected payload: {message}")]
    UnexpectedPayload { message: String },

    /// Configuration errors
    #[display("Configuration error: {message}")]
    Configuration { message: String },
}

impl Error for ClientError {}
