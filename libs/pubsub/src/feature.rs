//! Capabilities a pub/sub component implements natively.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

/// A behavior the underlying broker component handles itself.
///
/// When a component advertises a feature, the matching policy in this crate
/// is suppressed so the concern is not handled twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feature {
    /// The broker expires messages on its own.
    MessageTtl,
    /// The broker supports wildcard topic subscriptions.
    SubscribeWildcards,
    /// The broker accepts batches of messages in a single publish.
    BulkPublish,
}

impl Feature {
    /// The wire name of the feature.
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::MessageTtl => "MESSAGE_TTL",
            Feature::SubscribeWildcards => "SUBSCRIBE_WILDCARDS",
            Feature::BulkPublish => "BULK_PUBLISH",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "MESSAGE_TTL" => Ok(Feature::MessageTtl),
            "SUBSCRIBE_WILDCARDS" => Ok(Feature::SubscribeWildcards),
            "BULK_PUBLISH" => Ok(Feature::BulkPublish),
            other => Err(format!("unknown pub/sub feature: {other}")),
        }
    }
}

/// The set of features advertised by a component.
///
/// Deserializes from a list of feature names or from a single comma
/// separated string (`"MESSAGE_TTL,BULK_PUBLISH"`), the form environment
/// variables take.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeSet<Feature>);

impl<'de> Deserialize<'de> for FeatureSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FeatureList {
            List(BTreeSet<Feature>),
            Csv(String),
        }

        match FeatureList::deserialize(deserializer)? {
            FeatureList::List(features) => Ok(Self(features)),
            FeatureList::Csv(csv) => csv
                .split(',')
                .filter(|name| !name.trim().is_empty())
                .map(str::parse)
                .collect::<Result<BTreeSet<Feature>, String>>()
                .map(Self)
                .map_err(de::Error::custom),
        }
    }
}

impl FeatureSet {
    /// An empty set; every policy in this crate applies.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    pub fn insert(&mut self, feature: Feature) -> bool {
        self.0.insert(feature)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Feature; N]> for FeatureSet {
    fn from(features: [Feature; N]) -> Self {
        features.into_iter().collect()
    }
}
