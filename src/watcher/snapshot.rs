//! Cached snapshot types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Latest decoded stats document.
///
/// Unknown fields are ignored. `participants` and `stress_level` are both
/// optional on the wire; the agent decides what to do when neither is set.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StatsSnapshot {
    /// Current participant count as reported (may be fractional).
    #[serde(default)]
    pub participants: Option<f64>,

    /// Backend is finishing existing work and wants no new traffic.
    #[serde(default, deserialize_with = "flag")]
    pub graceful_shutdown: bool,

    /// Normalized 0..=1 load signal.
    #[serde(default)]
    pub stress_level: Option<f64>,
}

impl StatsSnapshot {
    /// Decode a stats payload. Fails for documents that do not describe
    /// stats at all (scalars, arrays, mistyped fields).
    pub fn from_payload(payload: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(payload)
    }
}

/// Accepts `true`/`false`, numbers (non-zero is set) and `null`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().map_or(false, |f| f != 0.0)),
        other => Err(D::Error::custom(format!("expected boolean or integer, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_integer_shutdown_flag() {
        let stats = StatsSnapshot::from_payload(json!({
            "graceful_shutdown": 0,
            "participants": 12,
            "stress_level": 0.25,
            "conferences": 3
        }))
        .unwrap();

        assert!(!stats.graceful_shutdown);
        assert_eq!(stats.participants, Some(12.0));
        assert_eq!(stats.stress_level, Some(0.25));

        let stats = StatsSnapshot::from_payload(json!({ "graceful_shutdown": 1 })).unwrap();
        assert!(stats.graceful_shutdown);
        assert_eq!(stats.participants, None);
    }

    #[test]
    fn null_fields_are_absent() {
        let stats = StatsSnapshot::from_payload(json!({
            "graceful_shutdown": null,
            "participants": 4,
            "stress_level": null
        }))
        .unwrap();
        assert!(!stats.graceful_shutdown);
        assert_eq!(stats.stress_level, None);
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(StatsSnapshot::from_payload(json!(42)).is_err());
        assert!(StatsSnapshot::from_payload(json!({ "graceful_shutdown": "yes" })).is_err());
        assert!(StatsSnapshot::from_payload(json!({ "participants": "many" })).is_err());
    }
}
