//! Store configuration, per-call overrides and key filters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Advisory, Result, StoreError, Validated};
use crate::expiry::{NO_EXPIRY, TimeUnit};
use crate::guard::{self, Kind};

/// Per-store settings. Fixed once the store is built.
///
/// # Example
///
/// ```rust
/// use nskv::{StoreConfig, TimeUnit};
///
/// let config = StoreConfig::default()
///     .with_prefix("app")
///     .with_suffix("v1")
///     .with_expiry(7, TimeUnit::D);
/// assert_eq!(config.link_sign, ".");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    pub prefix: String,
    pub suffix: String,
    /// Separator between prefix, key and suffix (default `.`).
    pub link_sign: String,
    /// Default reset policy: overwrite live entries on `set`.
    #[serde(rename = "isReset")]
    pub reset: bool,
    /// Default expiry duration; `-1` means never.
    #[serde(rename = "expireTime")]
    pub expiry: i64,
    #[serde(rename = "typeTime")]
    pub unit: TimeUnit,
    /// File for the durable backend. Memory-only when unset.
    pub path: Option<PathBuf>,
    /// Durable backend saves after every mutation and on drop.
    pub auto_save: bool,
    /// Durable backend keeps a `.bak` copy of the previous file.
    pub backup: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            link_sign: ".".to_string(),
            reset: true,
            expiry: NO_EXPIRY,
            unit: TimeUnit::Ms,
            path: None,
            auto_save: false,
            backup: false,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_link_sign(mut self, sign: impl Into<String>) -> Self {
        self.link_sign = sign.into();
        self
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Default expiry for every `set` that does not pass its own.
    pub fn with_expiry(mut self, duration: i64, unit: TimeUnit) -> Self {
        self.expiry = duration;
        self.unit = unit;
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_auto_save(mut self) -> Self {
        self.auto_save = true;
        self
    }

    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.backup = enabled;
        self
    }

    /// Reads a config from untyped JSON. Fields that are present must have the
    /// right kind; absent fields keep their defaults and unknown fields are ignored.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = as_object(value, "config")?;
        let mut config = Self::default();

        if let Some(v) = string_field(obj, "prefix")? {
            config.prefix = v;
        }
        if let Some(v) = string_field(obj, "suffix")? {
            config.suffix = v;
        }
        if let Some(v) = string_field(obj, "linkSign")? {
            config.link_sign = v;
        }
        if let Some(v) = bool_field(obj, "isReset")? {
            config.reset = v;
        }
        if let Some(v) = duration_field(obj, "expireTime")? {
            config.expiry = v;
        }
        if let Some(v) = unit_field(obj, "typeTime")? {
            config.unit = v;
        }
        if let Some(v) = string_field(obj, "path")? {
            config.path = Some(PathBuf::from(v));
        }
        if let Some(v) = bool_field(obj, "autoSave")? {
            config.auto_save = v;
        }
        if let Some(v) = bool_field(obj, "backup")? {
            config.backup = v;
        }
        Ok(config)
    }
}

/// Per-call overrides for `set`. Unset fields fall back to the store defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub reset: Option<bool>,
    /// Duration in `unit`s. `-1` forces "never expires" even when the store
    /// has a default expiry; `0` counts as unset.
    pub expiry: Option<i64>,
    pub unit: Option<TimeUnit>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = Some(reset);
        self
    }

    pub fn expire_in(mut self, duration: i64, unit: TimeUnit) -> Self {
        self.expiry = Some(duration);
        self.unit = Some(unit);
        self
    }

    /// Reads `{ isReset, expireTime, typeTime }`; `null` counts as absent.
    pub fn from_json(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let obj = as_object(value, "options")?;
        Ok(Self {
            reset: bool_field(obj, "isReset")?,
            expiry: duration_field(obj, "expireTime")?,
            unit: unit_field(obj, "typeTime")?,
        })
    }
}

/// Namespace filter for `list_keys` and `clear_matching`. Each field is
/// independent; an unset prefix or suffix matches anything in that position
/// and an unset link sign falls back to the store's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFilter {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub link_sign: Option<String>,
}

impl KeyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn link_sign(mut self, sign: impl Into<String>) -> Self {
        self.link_sign = Some(sign.into());
        self
    }

    /// True when at least one of the three fields is set.
    pub fn is_scoped(&self) -> bool {
        self.prefix.is_some() || self.suffix.is_some() || self.link_sign.is_some()
    }

    /// Reads a filter from untyped JSON. A non-object is an advisory and
    /// yields no filter; a present field that is not a string is fatal.
    pub fn from_json(value: &Value) -> Result<Validated<Option<Self>>> {
        let Some(obj) = value.as_object() else {
            return Ok(Validated::Advisory(None, Advisory::MalformedFilter));
        };
        Ok(Validated::Clean(Some(Self {
            prefix: string_field(obj, "prefix")?,
            suffix: string_field(obj, "suffix")?,
            link_sign: string_field(obj, "linkSign")?,
        })))
    }
}

fn as_object<'a>(value: &'a Value, name: &'static str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or(StoreError::invalid(name, Kind::Object.describe()))
}

/// Present field of the required kind, or a fatal error.
fn checked<'a>(
    obj: &'a Map<String, Value>,
    name: &'static str,
    kind: Kind,
) -> Result<Option<&'a Value>> {
    match obj.get(name) {
        None => Ok(None),
        Some(v) if guard::matches(kind, Some(v)) => Ok(Some(v)),
        Some(_) => Err(StoreError::invalid(name, kind.describe())),
    }
}

fn string_field(obj: &Map<String, Value>, name: &'static str) -> Result<Option<String>> {
    Ok(checked(obj, name, Kind::String)?
        .and_then(Value::as_str)
        .map(str::to_string))
}

fn bool_field(obj: &Map<String, Value>, name: &'static str) -> Result<Option<bool>> {
    Ok(checked(obj, name, Kind::Boolean)?.and_then(Value::as_bool))
}

fn duration_field(obj: &Map<String, Value>, name: &'static str) -> Result<Option<i64>> {
    let Some(v) = checked(obj, name, Kind::Number)? else {
        return Ok(None);
    };
    if let Some(n) = v.as_i64() {
        return Ok(Some(n));
    }
    match v.as_f64() {
        Some(f) if f.fract() != 0.0 => Err(StoreError::FractionalExpiry(f)),
        Some(f) => Ok(Some(f as i64)),
        None => Err(StoreError::invalid(name, Kind::Number.describe())),
    }
}

fn unit_field(obj: &Map<String, Value>, name: &'static str) -> Result<Option<TimeUnit>> {
    checked(obj, name, Kind::String)?
        .and_then(Value::as_str)
        .map(str::parse)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.prefix, "");
        assert_eq!(config.link_sign, ".");
        assert!(config.reset);
        assert_eq!(config.expiry, NO_EXPIRY);
        assert_eq!(config.unit, TimeUnit::Ms);
        assert!(config.path.is_none());
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new()
            .with_prefix("app")
            .with_link_sign("@")
            .with_reset(false)
            .with_expiry(3, TimeUnit::H);
        assert_eq!(config.prefix, "app");
        assert_eq!(config.link_sign, "@");
        assert!(!config.reset);
        assert_eq!((config.expiry, config.unit), (3, TimeUnit::H));
    }

    #[test]
    fn test_config_from_json() {
        let config = StoreConfig::from_json(&json!({
            "prefix": "app",
            "suffix": "v1",
            "isReset": false,
            "expireTime": 30,
            "typeTime": "min",
            "somethingElse": 1,
        }))
        .unwrap();
        assert_eq!(config.prefix, "app");
        assert_eq!(config.suffix, "v1");
        assert!(!config.reset);
        assert_eq!(config.expiry, 30);
        assert_eq!(config.unit, TimeUnit::Min);
        assert_eq!(config.link_sign, ".");
    }

    #[test]
    fn test_config_from_json_rejects_bad_fields() {
        assert!(matches!(
            StoreConfig::from_json(&json!({"prefix": 5})),
            Err(StoreError::InvalidParameter { name: "prefix", .. })
        ));
        assert!(matches!(
            StoreConfig::from_json(&json!({"expireTime": 1.5})),
            Err(StoreError::FractionalExpiry(_))
        ));
        assert!(matches!(
            StoreConfig::from_json(&json!({"typeTime": "fortnight"})),
            Err(StoreError::UnknownTimeUnit(_))
        ));
        assert!(StoreConfig::from_json(&json!("app")).is_err());
    }

    #[test]
    fn test_config_serde_names() {
        let config: StoreConfig =
            serde_json::from_value(json!({"linkSign": "#", "typeTime": "d"})).unwrap();
        assert_eq!(config.link_sign, "#");
        assert_eq!(config.unit, TimeUnit::D);
        assert!(config.reset);
    }

    #[test]
    fn test_set_options_from_json() {
        let opts = SetOptions::from_json(&json!({"isReset": false, "expireTime": 10.0})).unwrap();
        assert_eq!(opts.reset, Some(false));
        assert_eq!(opts.expiry, Some(10));
        assert_eq!(opts.unit, None);

        assert_eq!(SetOptions::from_json(&Value::Null).unwrap(), SetOptions::default());
        assert!(matches!(
            SetOptions::from_json(&json!({"isReset": "yes"})),
            Err(StoreError::InvalidParameter { name: "isReset", .. })
        ));
        assert!(matches!(
            SetOptions::from_json(&json!({"typeTime": 3})),
            Err(StoreError::InvalidParameter { name: "typeTime", .. })
        ));
    }

    #[test]
    fn test_filter_from_json() {
        let parsed = KeyFilter::from_json(&json!({"prefix": "a"})).unwrap();
        assert_eq!(parsed, Validated::Clean(Some(KeyFilter::new().prefix("a"))));

        let parsed = KeyFilter::from_json(&json!("a")).unwrap();
        assert_eq!(parsed, Validated::Advisory(None, Advisory::MalformedFilter));

        assert!(KeyFilter::from_json(&json!({"suffix": 1})).is_err());
    }

    #[test]
    fn test_filter_scope() {
        assert!(!KeyFilter::new().is_scoped());
        assert!(KeyFilter::new().link_sign("-").is_scoped());
    }
}
