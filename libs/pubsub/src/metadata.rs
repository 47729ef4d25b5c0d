//! Well-known keys of the component / request metadata mapping.

use std::collections::HashMap;

use tracing::warn;

/// Relative time-to-live of a message, in whole seconds.
pub const TTL_IN_SECONDS: &str = "ttlInSeconds";

/// Looks up `key`, falling back to an ASCII case-insensitive match.
///
/// Configuration loaded from the environment arrives with lower-cased keys.
/// When several spellings match and none exactly, the lexicographically
/// smallest key wins.
pub fn get<'a>(metadata: &'a HashMap<String, String>, key: &str) -> Option<&'a String> {
    metadata.get(key).or_else(|| {
        metadata
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, v)| v)
    })
}

/// Reads the TTL from `metadata`.
///
/// Returns `None` when the key is absent or is not a non-negative decimal
/// integer. Invalid values are logged and otherwise ignored.
pub fn ttl_seconds(metadata: &HashMap<String, String>) -> Option<u64> {
    let raw = get(metadata, TTL_IN_SECONDS)?;

    // `u64::from_str` also takes a leading `+`
    let parsed = if raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.parse::<u64>().map_err(|e| e.to_string())
    } else {
        Err("not a decimal integer".to_string())
    };

    match parsed {
        Ok(seconds) => Some(seconds),
        Err(e) => {
            warn!(key = TTL_IN_SECONDS, value = %raw, error = %e, "Ignoring invalid TTL metadata");
            None
        }
    }
}
