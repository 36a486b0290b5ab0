//! One logical remote call: admission, retries, classification and decoding.

use std::sync::Arc;
use std::thread::sleep;

use error_stack::Report;
use error_stack::ResultExt;
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing::warn;
use url::Url;

use crate::config::RetryPolicy;
use crate::config::TransientKind;
use crate::error::ClientError;
use crate::error::ClientResult;
use crate::limiter::ConnectionLimiter;
use crate::transport::HttpTransport;
use crate::transport::RawResponse;
use crate::transport::Transport;
use crate::transport::TransportFailure;

/// Outcome of a call that may legitimately address nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Lookup::NotFound)
    }

    /// Turns `NotFound` into [`ClientError::NotFound`] for callers that
    /// require the resource.
    pub fn required(self, url: &Url) -> ClientResult<T> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(Report::new(ClientError::NotFound {
                url: url.to_string(),
            })),
        }
    }
}

enum Attempt<P> {
    Done(ClientResult<Lookup<P>>),
    Transient(TransientKind),
}

/// Performs calls through a shared [`ConnectionLimiter`], retrying timeouts
/// and rate limiting with linear backoff.
pub struct RetryingClient<T = HttpTransport> {
    transport: T,
    limiter: Arc<ConnectionLimiter>,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingClient<T> {
    pub fn new(transport: T, limiter: Arc<ConnectionLimiter>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            limiter,
            policy,
        }
    }

    pub fn limiter(&self) -> &Arc<ConnectionLimiter> {
        &self.limiter
    }

    /// GET `url` and decode the JSON body into `P`.
    ///
    /// One limiter slot is held across every attempt of the call. HTTP 404
    /// yields [`Lookup::NotFound`] without retrying.
    ///
    /// # Errors
    ///
    /// - [`ClientError::RetriesExhausted`] if the last permitted attempt failed transiently
    /// - [`ClientError::Status`] on any other status outside 200-399
    /// - [`ClientError::Transport`] on a non-timeout transport failure
    /// - [`ClientError::Decode`] if the body does not decode into `P`
    pub fn call<P: DeserializeOwned>(&self, url: &Url) -> ClientResult<Lookup<P>> {
        let _permit = self.limiter.acquire();
        let max_attempts = self.policy.attempts();

        let mut attempt = 0;
        loop {
            attempt += 1;
            let kind = match self.attempt(url) {
                Attempt::Done(result) => {
                    debug!(%url, attempt, "Request finished");
                    return result;
                }
                Attempt::Transient(kind) => kind,
            };

            if attempt >= max_attempts {
                return Err(Report::new(ClientError::RetriesExhausted { attempts: attempt })
                    .attach_printable(format!("last failure: {kind}"))
                    .attach_printable(format!("url: {url}")));
            }

            let delay = self.policy.backoff(attempt, kind);
            warn!(%url, attempt, ?delay, "Got {kind} while executing request, slowing down and retrying");
            sleep(delay);
        }
    }

    fn attempt<P: DeserializeOwned>(&self, url: &Url) -> Attempt<P> {
        match self.transport.get(url) {
            Ok(RawResponse { status: 429, .. }) => Attempt::Transient(TransientKind::RateLimited),
            Ok(response) => Attempt::Done(evaluate(url, response)),
            Err(TransportFailure::Timeout(_)) => Attempt::Transient(TransientKind::Timeout),
            Err(failure) => Attempt::Done(Err(Report::new(failure)
                .change_context(ClientError::Transport)
                .attach_printable(format!("url: {url}")))),
        }
    }
}

fn evaluate<P: DeserializeOwned>(url: &Url, response: RawResponse) -> ClientResult<Lookup<P>> {
    match response.status {
        404 => Ok(Lookup::NotFound),
        200..=399 => serde_json::from_slice(&response.body)
            .map(Lookup::Found)
            .change_context(ClientError::Decode)
            .attach_printable_lazy(|| format!("url: {url}")),
        status => Err(Report::new(ClientError::Status { status })
            .attach_printable(format!("url: {url}"))
            .attach_printable(format!(
                "body: {}",
                String::from_utf8_lossy(&response.body)
            ))),
    }
}
