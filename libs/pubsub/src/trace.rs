//! Trace context injection into serialized envelopes.
//!
//! The envelope is decoded as an ordered JSON object rather than as an
//! [`Envelope`](crate::Envelope), so attributes this crate does not model pass
//! through untouched and in their original order.

use serde_json::{Map, Value};

use crate::error::PubsubError;

/// Attribute carrying the trace identifier.
pub const TRACE_ID_FIELD: &str = "traceid";

/// W3C trace context `traceparent` extension attribute.
pub const TRACE_PARENT_FIELD: &str = "traceparent";

/// W3C trace context `tracestate` extension attribute.
pub const TRACE_STATE_FIELD: &str = "tracestate";

/// Sets the trace identifier of a serialized envelope.
///
/// Returns a new buffer; `cloud_event` itself is not modified.
pub fn set_trace_id(cloud_event: &[u8], trace_id: &str) -> Result<Vec<u8>, PubsubError> {
    set_field(cloud_event, TRACE_ID_FIELD, trace_id)
}

/// Sets the W3C trace context attributes of a serialized envelope.
///
/// An empty `tracestate` is not written.
pub fn set_trace_context(
    cloud_event: &[u8],
    traceparent: &str,
    tracestate: &str,
) -> Result<Vec<u8>, PubsubError> {
    let mut document = decode(cloud_event)?;
    document.insert(TRACE_PARENT_FIELD.to_string(), Value::from(traceparent));
    if !tracestate.is_empty() {
        document.insert(TRACE_STATE_FIELD.to_string(), Value::from(tracestate));
    }
    Ok(serde_json::to_vec(&document)?)
}

/// Inserts or overwrites one top-level string attribute of a serialized
/// envelope, keeping every other attribute as it was.
pub fn set_field(cloud_event: &[u8], field: &str, value: &str) -> Result<Vec<u8>, PubsubError> {
    let mut document = decode(cloud_event)?;
    document.insert(field.to_string(), Value::from(value));
    Ok(serde_json::to_vec(&document)?)
}

fn decode(cloud_event: &[u8]) -> Result<Map<String, Value>, PubsubError> {
    serde_json::from_slice(cloud_event).map_err(PubsubError::malformed)
}
