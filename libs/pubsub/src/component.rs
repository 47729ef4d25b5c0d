//! Pub/sub component configuration.
//!
//! A component is described by its name, the features its broker implements
//! natively and a free-form metadata mapping:
//!
//! ```yaml
//! name: orders
//! features: [MESSAGE_TTL]
//! metadata:
//!   ttlInSeconds: "60"
//! ```
//!
//! Files are layered with `PUBSUB_`-prefixed environment variables, e.g.
//! `PUBSUB_FEATURES=MESSAGE_TTL,BULK_PUBLISH` or `PUBSUB_METADATA__TTLINSECONDS=60`.
//! Environment values are taken as plain strings, and a metadata key from the
//! environment replaces the file's key of the same name in any letter case.

use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::debug;

use crate::envelope::Envelope;
use crate::error::PubsubError;
use crate::feature::FeatureSet;

/// Prefix of environment overrides.
const ENV_PREFIX: &str = "PUBSUB";

/// Configuration of one pub/sub component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ComponentConfig {
    /// Component name, written to `pubsubname`.
    #[serde(default)]
    pub name: String,

    /// Features the broker implements natively.
    #[serde(default)]
    pub features: FeatureSet,

    /// Component metadata (`ttlInSeconds`, broker settings, ...).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ComponentConfig {
    /// Loads configuration from `path` (format chosen by extension), then
    /// applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PubsubError> {
        Self::load_with(path.as_ref(), env_overrides())
    }

    fn load_with(path: &Path, env: Environment) -> Result<Self, PubsubError> {
        let mut component: Self = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        let overrides: Overrides = Config::builder().add_source(env).build()?.try_deserialize()?;
        component.merge(overrides);
        Ok(component)
    }

    /// Parses configuration from an in-memory document. The environment is
    /// not consulted.
    pub fn from_contents(contents: &str, format: FileFormat) -> Result<Self, PubsubError> {
        let config = Config::builder()
            .add_source(File::from_str(contents, format))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Applies this component's TTL policy to `envelope`.
    pub fn apply(&self, envelope: &mut Envelope) {
        envelope.apply_metadata(&self.features, &self.metadata);
    }

    fn merge(&mut self, overrides: Overrides) {
        if let Some(name) = overrides.name {
            self.name = name;
        }
        if let Some(features) = overrides.features {
            self.features = features;
        }

        // Environment keys arrive lower-cased; they replace the file's
        // spelling of the same key rather than sitting next to it.
        for (key, value) in overrides.metadata {
            let key = self
                .metadata
                .keys()
                .find(|existing| existing.eq_ignore_ascii_case(&key))
                .cloned()
                .unwrap_or(key);
            debug!(key = %key, "Metadata overridden from environment");
            self.metadata.insert(key, value);
        }
    }
}

/// Settings taken from the environment; absent fields keep the file's value.
#[derive(Debug, Default, Deserialize)]
struct Overrides {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    features: Option<FeatureSet>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

// Values stay strings: metadata is opaque text and `FeatureSet` parses the
// comma separated form itself.
fn env_overrides() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
