//! Event envelope - the CloudEvents wrapper for every published message.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::content::{self, Data, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
use crate::error::PubsubError;

/// CloudEvents specification version stamped on every envelope.
pub const SPEC_VERSION: &str = "1.0";

/// Event type used when the publisher does not name one.
pub const DEFAULT_EVENT_TYPE: &str = "com.courier.event.sent";

/// Extension attribute values, keyed by attribute name.
pub type Extensions = Map<String, Value>;

/// Attribute names owned by the envelope itself. Extensions may not use them.
pub const RESERVED_ATTRIBUTES: [&str; 10] = [
    "id",
    "source",
    "type",
    "specversion",
    "datacontenttype",
    "data",
    "topic",
    "pubsubname",
    "traceid",
    "expiration",
];

/// Returns true if `name` is one of the envelope's own attributes.
pub fn is_reserved_attribute(name: &str) -> bool {
    RESERVED_ATTRIBUTES.contains(&name)
}

/// The message envelope.
///
/// Serializes to the CloudEvents 1.0 JSON format. Extension attributes are
/// written at the top level next to the core attributes; an extension that
/// reuses a reserved attribute name is not written.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WireEnvelope")]
pub struct Envelope {
    /// Publisher-assigned message identifier.
    pub id: String,

    /// Identifier of the producer.
    pub source: String,

    /// The event type (defaults to [`DEFAULT_EVENT_TYPE`]).
    pub event_type: String,

    /// Always [`SPEC_VERSION`].
    pub spec_version: String,

    /// Content type of `data`; never empty.
    pub data_content_type: String,

    /// The payload.
    pub data: Data,

    /// Topic the message is routed to.
    pub topic: String,

    /// Name of the pub/sub component carrying the message.
    pub pubsub_name: String,

    /// Distributed tracing correlation identifier.
    pub trace_id: String,

    /// RFC 3339 expiration, empty unless a TTL was applied.
    pub expiration: String,

    /// Extension attributes.
    pub extensions: Extensions,
}

impl Envelope {
    /// Creates a new envelope builder.
    pub fn builder() -> EnvelopeBuilder {
        EnvelopeBuilder::new()
    }

    /// Decodes an envelope that is already on the wire and re-routes it.
    ///
    /// `topic`, `pubsub_name` and `trace_id` replace whatever the document
    /// carried; every other attribute, unknown ones included, is kept.
    ///
    /// The data variant follows the declared content type. A text payload
    /// declared as JSON at build time therefore decodes as a structured JSON
    /// string rather than [`Data::Text`].
    pub fn from_cloud_event(
        cloud_event: &[u8],
        topic: &str,
        pubsub_name: &str,
        trace_id: &str,
    ) -> Result<Self, PubsubError> {
        let mut envelope: Envelope =
            serde_json::from_slice(cloud_event).map_err(PubsubError::malformed)?;

        envelope.topic = topic.to_string();
        envelope.pubsub_name = pubsub_name.to_string();
        envelope.trace_id = trace_id.to_string();
        Ok(envelope)
    }

    /// Serializes the envelope to JSON bytes.
    pub fn to_json_vec(&self) -> Result<Vec<u8>, PubsubError> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("source", &self.source)?;
        map.serialize_entry("type", &self.event_type)?;
        map.serialize_entry("specversion", &self.spec_version)?;
        map.serialize_entry("datacontenttype", &self.data_content_type)?;
        map.serialize_entry("data", &self.data)?;
        map.serialize_entry("topic", &self.topic)?;
        map.serialize_entry("pubsubname", &self.pubsub_name)?;
        if !self.trace_id.is_empty() {
            map.serialize_entry("traceid", &self.trace_id)?;
        }
        if !self.expiration.is_empty() {
            map.serialize_entry("expiration", &self.expiration)?;
        }
        for (name, value) in &self.extensions {
            if !is_reserved_attribute(name) {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

/// Builder for constructing envelopes.
///
/// Every field is optional; [`build`](Self::build) fills in defaults instead
/// of failing.
#[derive(Debug, Default)]
pub struct EnvelopeBuilder {
    id: String,
    source: String,
    event_type: String,
    topic: String,
    pubsub_name: String,
    content_type: String,
    payload: Vec<u8>,
    trace_id: String,
    extensions: Extensions,
}

impl EnvelopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the event type. An empty type is replaced by [`DEFAULT_EVENT_TYPE`].
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    /// Accepted for compatibility with publishers that still send an event
    /// type version. The value is discarded.
    pub fn type_version(self, _version: impl Into<String>) -> Self {
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn pubsub_name(mut self, pubsub_name: impl Into<String>) -> Self {
        self.pubsub_name = pubsub_name.into();
        self
    }

    /// Declares the payload's content type, bypassing sniffing.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Adds an extension attribute. Reserved attribute names are ignored.
    pub fn extension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if is_reserved_attribute(&name) {
            debug!(name = %name, "Ignoring extension with reserved attribute name");
            return self;
        }
        self.extensions.insert(name, Value::String(value.into()));
        self
    }

    /// Builds the envelope.
    pub fn build(self) -> Envelope {
        let (data_content_type, data) = content::sniff(&self.content_type, &self.payload);

        Envelope {
            id: self.id,
            source: self.source,
            event_type: or_default_type(self.event_type),
            spec_version: SPEC_VERSION.to_string(),
            data_content_type,
            data,
            topic: self.topic,
            pubsub_name: self.pubsub_name,
            trace_id: self.trace_id,
            expiration: String::new(),
            extensions: self.extensions,
        }
    }
}

fn or_default_type(event_type: String) -> String {
    if event_type.is_empty() {
        DEFAULT_EVENT_TYPE.to_string()
    } else {
        event_type
    }
}

/// Loosely typed form of an envelope as found on the wire.
#[derive(Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    id: String,
    #[serde(default)]
    source: String,
    #[serde(rename = "type", default)]
    event_type: String,
    #[serde(rename = "specversion", default)]
    spec_version: String,
    #[serde(rename = "datacontenttype", default)]
    data_content_type: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    topic: String,
    #[serde(rename = "pubsubname", default)]
    pubsub_name: String,
    #[serde(rename = "traceid", default)]
    trace_id: String,
    #[serde(default)]
    expiration: String,
    extensions: Extensions,
}

impl From<WireEnvelope> for Envelope {
    fn from(wire: WireEnvelope) -> Self {
        if !wire.spec_version.is_empty() && wire.spec_version != SPEC_VERSION {
            debug!(id = %wire.id, spec_version = %wire.spec_version, "Normalizing envelope spec version");
        }

        let data_content_type = match (wire.data_content_type.is_empty(), &wire.data) {
            (false, _) => wire.data_content_type,
            (true, None | Some(Value::Null) | Some(Value::String(_))) => {
                TEXT_CONTENT_TYPE.to_string()
            }
            (true, Some(_)) => JSON_CONTENT_TYPE.to_string(),
        };

        let data = if content::is_json_content_type(&data_content_type) {
            Data::Structured(wire.data.unwrap_or(Value::Null))
        } else {
            match wire.data {
                None | Some(Value::Null) => Data::default(),
                Some(Value::String(text)) => Data::Text(text),
                Some(value) => Data::Structured(value),
            }
        };

        Envelope {
            id: wire.id,
            source: wire.source,
            event_type: or_default_type(wire.event_type),
            spec_version: SPEC_VERSION.to_string(),
            data_content_type,
            data,
            topic: wire.topic,
            pubsub_name: wire.pubsub_name,
            trace_id: wire.trace_id,
            expiration: wire.expiration,
            extensions: wire.extensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_builder_defaults() {
        let envelope = Envelope::builder().id("a").source("source").build();

        assert_eq!(envelope.id, "a");
        assert_eq!(envelope.source, "source");
        assert_eq!(envelope.event_type, DEFAULT_EVENT_TYPE);
        assert_eq!(envelope.spec_version, SPEC_VERSION);
        assert_eq!(envelope.data_content_type, TEXT_CONTENT_TYPE);
        assert!(envelope.data.is_empty());
        assert_eq!(envelope.expiration, "");
        assert!(envelope.extensions.is_empty());
    }

    #[test]
    fn test_envelope_builder_passes_fields_through() {
        let envelope = Envelope::builder()
            .id("a")
            .event_type("e1")
            .type_version("v2")
            .topic("routed.topic")
            .pubsub_name("mypubsub")
            .trace_id("1")
            .content_type("application/xml")
            .payload("<root/>")
            .build();

        assert_eq!(envelope.event_type, "e1");
        assert_eq!(envelope.topic, "routed.topic");
        assert_eq!(envelope.pubsub_name, "mypubsub");
        assert_eq!(envelope.trace_id, "1");
        assert_eq!(envelope.data_content_type, "application/xml");
        assert_eq!(envelope.data, Data::Text("<root/>".to_string()));
    }

    #[test]
    fn test_spec_version_ignores_embedded_cloud_event() {
        let envelope = Envelope::builder()
            .payload(r#"{"specversion":"0.3","type":"inner"}"#)
            .build();

        assert_eq!(envelope.spec_version, SPEC_VERSION);
        assert_eq!(envelope.event_type, DEFAULT_EVENT_TYPE);
        assert_eq!(envelope.data_content_type, JSON_CONTENT_TYPE);
    }

    #[test]
    fn test_envelope_serialization() {
        let envelope = Envelope::builder()
            .id("a")
            .source("source")
            .topic("orders")
            .pubsub_name("mypubsub")
            .payload(r#"{"n":1}"#)
            .extension("partitionkey", "p1")
            .build();

        let value: Value = serde_json::from_slice(&envelope.to_json_vec().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "a",
                "source": "source",
                "type": DEFAULT_EVENT_TYPE,
                "specversion": "1.0",
                "datacontenttype": "application/json",
                "data": {"n": 1},
                "topic": "orders",
                "pubsubname": "mypubsub",
                "partitionkey": "p1"
            })
        );
    }

    #[test]
    fn test_from_cloud_event_keeps_extensions() {
        let raw = json!({
            "specversion": "1.0",
            "type": "com.github.pull.create",
            "source": "https://github.com/cloudevents/spec/pull",
            "subject": "123",
            "id": "A234-1234-1234",
            "comexampleextension1": "value",
            "comexampleothervalue": 5,
            "datacontenttype": "text/xml",
            "data": "<much wow=\"xml\"/>",
            "expiration": "2026-10-18T09:30:00Z"
        });

        let envelope = Envelope::from_cloud_event(
            &serde_json::to_vec(&raw).unwrap(),
            "routed.topic",
            "mypubsub",
            "trace-1",
        )
        .unwrap();

        assert_eq!(envelope.id, "A234-1234-1234");
        assert_eq!(envelope.event_type, "com.github.pull.create");
        assert_eq!(envelope.data_content_type, "text/xml");
        assert_eq!(envelope.data, Data::Text("<much wow=\"xml\"/>".to_string()));
        assert_eq!(envelope.topic, "routed.topic");
        assert_eq!(envelope.pubsub_name, "mypubsub");
        assert_eq!(envelope.trace_id, "trace-1");
        assert_eq!(envelope.expiration, "2026-10-18T09:30:00Z");
        assert_eq!(envelope.extensions["subject"], json!("123"));
        assert_eq!(envelope.extensions["comexampleothervalue"], json!(5));
        assert!(!envelope.extensions.contains_key("data"));
    }

    #[test]
    fn test_from_cloud_event_infers_missing_content_type() {
        let envelope =
            Envelope::from_cloud_event(br#"{"id":"x","data":{"k":true}}"#, "t", "p", "").unwrap();
        assert_eq!(envelope.data_content_type, JSON_CONTENT_TYPE);
        assert_eq!(envelope.data, Data::Structured(json!({"k": true})));
        assert_eq!(envelope.event_type, DEFAULT_EVENT_TYPE);
        assert_eq!(envelope.spec_version, SPEC_VERSION);

        let envelope = Envelope::from_cloud_event(br#"{"id":"y"}"#, "t", "p", "").unwrap();
        assert_eq!(envelope.data_content_type, TEXT_CONTENT_TYPE);
        assert!(envelope.data.is_empty());
    }

    #[test]
    fn test_from_cloud_event_json_string_data_stays_structured() {
        let envelope = Envelope::from_cloud_event(
            br#"{"datacontenttype":"application/json","data":"hello"}"#,
            "t",
            "p",
            "",
        )
        .unwrap();
        assert_eq!(envelope.data, Data::Structured(json!("hello")));
    }

    #[test]
    fn test_from_cloud_event_rejects_malformed() {
        let err = Envelope::from_cloud_event(b"a", "t", "p", "").unwrap_err();
        assert!(matches!(err, PubsubError::MalformedPayload(_)));

        let err = Envelope::from_cloud_event(b"[1,2]", "t", "p", "").unwrap_err();
        assert!(matches!(err, PubsubError::MalformedPayload(_)));
    }

    #[test]
    fn test_envelope_round_trip_through_wire() {
        let mut envelope = Envelope::builder()
            .id("a")
            .payload("v1,v2,v3")
            .trace_id("t")
            .extension("tenant", "acme")
            .build();
        envelope.expiration = "2026-10-18T09:30:00Z".to_string();

        let decoded: Envelope = serde_json::from_slice(&envelope.to_json_vec().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_json_hint_text_decodes_as_structured_string() {
        let envelope = Envelope::builder()
            .id("a")
            .content_type(JSON_CONTENT_TYPE)
            .payload(r#"{"n":1}"#)
            .build();
        assert_eq!(envelope.data, Data::Text(r#"{"n":1}"#.to_string()));

        let decoded: Envelope = serde_json::from_slice(&envelope.to_json_vec().unwrap()).unwrap();
        assert_eq!(decoded.data, Data::Structured(json!(r#"{"n":1}"#)));
        assert_eq!(
            Envelope {
                data: envelope.data.clone(),
                ..decoded
            },
            envelope
        );
    }

    #[test]
    fn test_reserved_extension_names_are_ignored() {
        let envelope = Envelope::builder()
            .id("a")
            .trace_id("t")
            .extension("traceid", "x")
            .extension("id", "y")
            .extension("data", "z")
            .extension("tenant", "acme")
            .build();

        assert_eq!(envelope.id, "a");
        assert_eq!(envelope.trace_id, "t");
        assert_eq!(envelope.extensions.len(), 1);

        let decoded = Envelope::from_cloud_event(&envelope.to_json_vec().unwrap(), "", "", "t")
            .unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_reserved_extensions_are_not_serialized() {
        let mut envelope = Envelope::builder().id("a").trace_id("t").build();
        envelope
            .extensions
            .insert("traceid".to_string(), json!("x"));
        envelope.extensions.insert("id".to_string(), json!("y"));

        let bytes = envelope.to_json_vec().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(text.matches("\"traceid\"").count(), 1);
        assert_eq!(text.matches("\"id\"").count(), 1);

        let decoded = Envelope::from_cloud_event(&bytes, "", "", "t").unwrap();
        assert_eq!(decoded.id, "a");
        assert!(decoded.extensions.is_empty());
    }
}
