//! The envelope persisted for one physical key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::expiry::{self, NO_EXPIRY, TimeUnit};

/// Serialized as `{ key, value, isReset, expireTime, typeTime }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Physical key the entry was written under.
    pub key: String,
    pub value: Value,
    /// Reset policy in effect when this entry was written.
    #[serde(default)]
    pub is_reset: bool,
    /// Absolute expiry in ms since the epoch, or `NO_EXPIRY`.
    #[serde(default = "no_expiry")]
    pub expire_time: i64,
    /// Unit the caller used. Informational only.
    #[serde(default)]
    pub type_time: TimeUnit,
}

fn no_expiry() -> i64 {
    NO_EXPIRY
}

impl Entry {
    pub fn new(
        key: String,
        value: Value,
        is_reset: bool,
        expire_time: i64,
        type_time: TimeUnit,
    ) -> Self {
        Self {
            key,
            value,
            is_reset,
            expire_time,
            type_time,
        }
    }

    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Parses a stored envelope. Anything that is not one yields `None`.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn has_expiry(&self) -> bool {
        self.expire_time > 0
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        expiry::is_expired(self.expire_time, now)
    }

    /// Reads only the `expireTime` of a stored string. Unparsable data, or a
    /// missing or non-numeric field, counts as `NO_EXPIRY`.
    pub fn stored_expiry(raw: &str) -> i64 {
        serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|v| v.get("expireTime").and_then(Value::as_f64))
            .filter(|t| t.is_finite())
            .map_or(NO_EXPIRY, |t| t as i64)
    }

    /// Liveness as seen by key enumeration. A key with no stored data is dead.
    pub fn raw_is_live(raw: Option<&str>, now: i64) -> bool {
        match raw {
            Some(raw) => !expiry::is_expired(Self::stored_expiry(raw), now),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_field_names() {
        let entry = Entry::new("app.user".into(), json!({"id": 1}), true, 1_500, TimeUnit::S);
        let raw = entry.encode().unwrap();
        let v: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            v,
            json!({
                "key": "app.user",
                "value": {"id": 1},
                "isReset": true,
                "expireTime": 1_500,
                "typeTime": "s",
            })
        );
        assert_eq!(Entry::decode(&raw), Some(entry));
    }

    #[test]
    fn test_decode_defaults() {
        let entry = Entry::decode(r#"{"key":"k","value":"v"}"#).unwrap();
        assert_eq!(entry.expire_time, NO_EXPIRY);
        assert_eq!(entry.type_time, TimeUnit::Ms);
        assert!(!entry.has_expiry());
        assert!(Entry::decode("not json").is_none());
    }

    #[test]
    fn test_expiry_checks() {
        let entry = Entry::new("k".into(), json!(1), true, 100, TimeUnit::Ms);
        assert!(!entry.is_expired_at(99));
        assert!(entry.is_expired_at(100));
    }

    #[test]
    fn test_stored_expiry() {
        assert_eq!(Entry::stored_expiry(r#"{"expireTime":1700000000000.0}"#), 1_700_000_000_000);
        assert_eq!(Entry::stored_expiry(r#"{"expireTime":"soon"}"#), NO_EXPIRY);
        assert_eq!(Entry::stored_expiry("garbage"), NO_EXPIRY);

        assert!(Entry::raw_is_live(Some("garbage"), 10));
        assert!(Entry::raw_is_live(Some(r#"{"expireTime":20}"#), 10));
        assert!(!Entry::raw_is_live(Some(r#"{"expireTime":5}"#), 10));
        assert!(!Entry::raw_is_live(None, 10));
    }
}
