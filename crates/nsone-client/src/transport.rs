//! Single-attempt HTTP GET against the provider API.

use derive_more::Display;
use error_stack::Report;
use error_stack::ResultExt;
use reqwest::blocking::Client as BlockingClient;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use url::Url;

use crate::error::ClientError;
use crate::error::ClientResult;
use crate::ClientConfig;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-NSONE-Key";

/// Status and body of one completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// An attempt that produced no response.
#[derive(Debug, Display)]
pub enum TransportFailure {
    #[display("request timed out: {_0}")]
    Timeout(String),
    #[display("request failed: {_0}")]
    Other(String),
}

impl core::error::Error for TransportFailure {}

/// One attempt of a GET request. Implementations do not retry.
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url) -> Result<RawResponse, TransportFailure>;
}

/// Blocking `reqwest` transport sending the API key with every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: BlockingClient,
}

impl HttpTransport {
    /// Must not be called from within an async runtime.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut api_key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            Report::new(ClientError::Configuration {
                message: "API key is not a valid header value".into(),
            })
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let http = BlockingClient::builder()
            .default_headers(headers)
            .connect_timeout(config.request_timeout)
            .timeout(config.request_timeout)
            .build()
            .change_context(ClientError::Configuration {
                message: "Failed to create blocking HTTP client".into(),
            })?;

        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<RawResponse, TransportFailure> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(classify)?.to_vec();
        Ok(RawResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::Timeout(err.to_string())
    } else {
        TransportFailure::Other(err.to_string())
    }
}
