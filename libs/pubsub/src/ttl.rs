//! Time-to-live policy: stamping and checking envelope expiration.
//!
//! Expirations are RFC 3339 timestamps with second precision in UTC, e.g.
//! `2026-10-18T09:30:00Z`. Anything else found in the `expiration` attribute is
//! treated as "never expires" rather than as an error.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeDelta, Utc};
use tracing::debug;

use crate::envelope::Envelope;
use crate::feature::{Feature, FeatureSet};
use crate::metadata;

/// The latest expiration that can be written, the last second RFC 3339 can
/// represent. Oversized TTLs saturate to this instant.
pub const MAX_EXPIRATION: &str = "9999-12-31T23:59:59Z";

/// Formats an expiration timestamp.
pub fn format_expiration(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses an expiration timestamp, returning `None` for foreign formats.
pub fn parse_expiration(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

fn latest_expiration() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Computes `now + ttl_seconds`, saturating at [`MAX_EXPIRATION`].
fn expiration_after(now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
    let ceiling = latest_expiration();
    let expires_at = i64::try_from(ttl_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl));

    match expires_at {
        Some(at) if at <= ceiling => at,
        _ => {
            debug!(ttl_seconds, "TTL exceeds representable range, saturating expiration");
            ceiling
        }
    }
}

impl Envelope {
    /// Applies the TTL found in `metadata` to this envelope.
    ///
    /// Does nothing when the component handles TTL natively
    /// ([`Feature::MessageTtl`]) or when no valid `ttlInSeconds` is present; in
    /// the latter case an existing expiration is kept.
    pub fn apply_metadata(&mut self, features: &FeatureSet, metadata: &HashMap<String, String>) {
        self.apply_metadata_at(features, metadata, Utc::now());
    }

    /// [`apply_metadata`](Self::apply_metadata) against an explicit clock.
    pub fn apply_metadata_at(
        &mut self,
        features: &FeatureSet,
        metadata: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) {
        if features.contains(Feature::MessageTtl) {
            return;
        }

        if let Some(ttl_seconds) = metadata::ttl_seconds(metadata) {
            self.expiration = format_expiration(expiration_after(now, ttl_seconds));
            debug!(id = %self.id, ttl_seconds, expiration = %self.expiration, "Applied message TTL");
        }
    }

    /// Returns true if the envelope's expiration lies in the past.
    ///
    /// An empty or unparsable expiration never expires.
    pub fn has_expired(&self) -> bool {
        self.has_expired_at(Utc::now())
    }

    /// [`has_expired`](Self::has_expired) against an explicit clock.
    pub fn has_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.expiration.is_empty() {
            return false;
        }

        match parse_expiration(&self.expiration) {
            Some(expires_at) => expires_at < now,
            None => {
                debug!(id = %self.id, expiration = %self.expiration, "Unparsable expiration, treating as not expired");
                false
            }
        }
    }
}
