//! # courier-pubsub
//!
//! Message envelope adapter for the courier pub/sub layer.
//!
//! ## Design Principles
//!
//! - Envelopes follow the CloudEvents 1.0 JSON format
//! - Construction and TTL application never fail; bad input degrades to defaults
//! - A malformed expiration never causes a message to be dropped
//! - Unknown attributes of a serialized envelope survive every rewrite
//!
//! ## Flow
//!
//! 1. Build an [`Envelope`] (content type and data are sniffed from the payload)
//! 2. Apply the component's TTL policy with [`Envelope::apply_metadata`]
//! 3. At delivery, drop messages for which [`Envelope::has_expired`] holds
//!
//! Envelopes already on the wire are re-stamped with [`set_trace_id`] or
//! [`set_trace_context`] without decoding them into typed values.

mod component;
mod content;
mod envelope;
mod error;
mod feature;
pub mod metadata;
mod trace;
mod ttl;

pub use component::ComponentConfig;
pub use config::FileFormat;
pub use content::{is_json_content_type, sniff, Data, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
pub use envelope::*;
pub use error::PubsubError;
pub use feature::{Feature, FeatureSet};
pub use trace::{
    set_field, set_trace_context, set_trace_id, TRACE_ID_FIELD, TRACE_PARENT_FIELD,
    TRACE_STATE_FIELD,
};
pub use ttl::{format_expiration, parse_expiration, MAX_EXPIRATION};
