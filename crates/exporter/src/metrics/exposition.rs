//! Prometheus text exposition of a gathered snapshot.

use error_stack::Report;
use prometheus::proto::MetricFamily;
use prometheus::TextEncoder;

use crate::error::CollectError;
use crate::error::CollectResult;

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

pub fn encode(families: &[MetricFamily]) -> CollectResult<String> {
    let mut buffer = String::new();
    TextEncoder::new()
        .encode_utf8(families, &mut buffer)
        .map_err(|err| Report::new(CollectError::Encoding).attach_printable(err.to_string()))?;
    Ok(buffer)
}
