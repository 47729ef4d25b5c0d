//! Shared fixtures for courier tests.

use std::collections::HashMap;

use chrono::{SecondsFormat, TimeDelta, Utc};

/// A CloudEvent as published by a third-party producer, including extension
/// attributes of several JSON types.
pub const THIRD_PARTY_CLOUD_EVENT: &str = r#"{
    "specversion" : "1.0",
    "type" : "com.github.pull.create",
    "source" : "https://github.com/cloudevents/spec/pull",
    "subject" : "123",
    "id" : "A234-1234-1234",
    "comexampleextension1" : "value",
    "comexampleothervalue" : 5,
    "datacontenttype" : "text/xml",
    "data" : "<much wow=\"xml\"/>"
}"#;

/// Builds a metadata mapping from key/value pairs.
pub fn metadata(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// RFC 3339 timestamp `hours` from now (negative for the past).
pub fn rfc3339_from_now(hours: i64) -> String {
    (Utc::now() + TimeDelta::hours(hours)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// RFC 2822 timestamp `hours` from now; a format expirations never use.
pub fn rfc2822_from_now(hours: i64) -> String {
    (Utc::now() + TimeDelta::hours(hours)).to_rfc2822()
}

/// Decodes JSON bytes into a generic value.
pub fn json(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).expect("fixture is valid JSON")
}
