//! Content sniffing - deciding what an envelope's payload is.

use serde::{Serialize, Serializer};

/// Content type recorded for payloads that decode as JSON.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type recorded for everything else.
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// The `data` attribute of an envelope.
///
/// The variant is decided once, when the envelope is built, and never
/// re-sniffed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// A decoded JSON document (object, array, number, string, bool or null).
    Structured(serde_json::Value),
    /// The payload kept as text.
    Text(String),
}

impl Data {
    /// Returns the decoded document, if the payload was structured.
    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Data::Structured(value) => Some(value),
            Data::Text(_) => None,
        }
    }

    /// Returns the raw text, if the payload was kept as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Data::Structured(_) => None,
            Data::Text(text) => Some(text),
        }
    }

    /// Returns true for a text payload with no content.
    pub fn is_empty(&self) -> bool {
        matches!(self, Data::Text(text) if text.is_empty())
    }
}

impl Default for Data {
    fn default() -> Self {
        Data::Text(String::new())
    }
}

impl Serialize for Data {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Data::Structured(value) => value.serialize(serializer),
            Data::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// Classifies a payload into a content type and a data value.
///
/// A non-empty `content_type` hint is trusted verbatim and the payload is kept
/// as text. Without a hint the payload is tried as JSON and falls back to
/// `text/plain`. Detection is by content only: an XML document with no hint is
/// plain text.
pub fn sniff(content_type: &str, payload: &[u8]) -> (String, Data) {
    if !content_type.is_empty() {
        return (content_type.to_string(), Data::Text(text_of(payload)));
    }

    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(value) => (JSON_CONTENT_TYPE.to_string(), Data::Structured(value)),
        Err(_) => (TEXT_CONTENT_TYPE.to_string(), Data::Text(text_of(payload))),
    }
}

/// Returns true if `content_type` denotes a JSON document.
///
/// Matches `application/json`, `text/json` and `+json` structured suffixes
/// such as `application/cloudevents+json`. Parameters are ignored.
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == JSON_CONTENT_TYPE || essence == "text/json" || essence.ends_with("+json")
}

fn text_of(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).into_owned()
}
