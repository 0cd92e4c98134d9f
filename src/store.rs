//! The store facade: namespaced keys, expiry envelopes and lazy eviction on
//! top of any [`Backend`].

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::backend::{Backend, BackendKind};
use crate::codec;
use crate::config::{KeyFilter, SetOptions, StoreConfig};
use crate::entry::Entry;
use crate::error::{Advisory, Result, StoreError, Validated};
use crate::expiry::{self, Clock, NO_EXPIRY, SystemClock};
use crate::validate;

/// What `set` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Written,
    /// A live entry existed and the reset policy was off.
    Skipped,
}

/// A key-value store bound to one backend for its whole life.
///
/// Logical keys are decorated with the configured prefix/suffix before they
/// reach the backend, and each value is wrapped in an [`Entry`] carrying its
/// absolute expiry. Expired entries are only noticed when read: `get`,
/// `exists` and `set` evict them, `list_keys` skips them.
///
/// Fatal input problems come back as `Err` before the backend is touched.
/// Non-fatal ones are logged and queued; drain them with
/// [`take_advisories`](Self::take_advisories).
///
/// # Example
///
/// ```rust
/// use nskv::{SessionBackend, Store, StoreConfig};
/// use serde_json::json;
///
/// let mut store = Store::new(SessionBackend::new(), StoreConfig::default().with_prefix("app"));
/// store.set("user", json!({"id": 1})).unwrap();
///
/// let user: Option<serde_json::Value> = store.get("user").unwrap();
/// assert_eq!(user, Some(json!({"id": 1})));
/// assert_eq!(store.list_keys(None).unwrap(), vec!["app.user"]);
/// ```
pub struct Store {
    backend: Box<dyn Backend>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    advisories: Vec<Advisory>,
}

impl Store {
    pub fn new<B: Backend + 'static>(backend: B, config: StoreConfig) -> Self {
        Self::from_boxed(Box::new(backend), config)
    }

    pub fn from_boxed(backend: Box<dyn Backend>, config: StoreConfig) -> Self {
        Self {
            backend,
            config,
            clock: Arc::new(SystemClock),
            advisories: Vec::new(),
        }
    }

    /// Replaces the wall clock used for expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn Backend {
        self.backend.as_mut()
    }

    /// Physical key for a logical one, without validation.
    pub fn physical_key(&self, key: &str) -> String {
        codec::compose(
            key,
            &self.config.prefix,
            &self.config.suffix,
            &self.config.link_sign,
        )
    }

    /// Advisories raised since the last call, oldest first.
    pub fn take_advisories(&mut self) -> Vec<Advisory> {
        std::mem::take(&mut self.advisories)
    }

    fn advise(&mut self, advisory: Advisory) {
        warn!(backend = %self.backend.kind(), "{advisory}");
        self.advisories.push(advisory);
    }

    fn note<T>(&mut self, checked: Validated<T>) -> T {
        let (value, advisory) = checked.into_parts();
        if let Some(advisory) = advisory {
            self.advise(advisory);
        }
        value
    }

    fn fatal<T>(&self, err: StoreError) -> Result<T> {
        error!(backend = %self.backend.kind(), "{err}");
        Err(err)
    }

    /// Validates `key` and returns its physical form.
    fn checked_key(&mut self, key: &str) -> Result<String> {
        match validate::validate_key(key) {
            Ok(checked) => {
                let key = self.note(checked);
                Ok(self.physical_key(key))
            }
            Err(e) => self.fatal(e),
        }
    }

    /// Reads the entry under `physical`, evicting it if it has expired.
    fn read_live(&mut self, physical: &str) -> Result<Option<Entry>> {
        let Some(raw) = self.backend.get_item(physical)? else {
            return Ok(None);
        };
        let Some(entry) = Entry::decode(&raw) else {
            warn!(key = %physical, "stored data is not an entry, ignoring");
            return Ok(None);
        };

        if entry.is_expired_at(self.clock.now_ms()) {
            self.backend.remove_item(physical)?;
            debug!(key = %physical, "evicted expired entry");
            self.advise(Advisory::Expired {
                key: physical.to_string(),
            });
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// Stores `value` with the store's default reset policy and expiry.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<SetOutcome> {
        self.set_with(key, value, SetOptions::default())
    }

    pub fn set_with<T: Serialize>(
        &mut self,
        key: &str,
        value: T,
        options: SetOptions,
    ) -> Result<SetOutcome> {
        let value = serde_json::to_value(value)?;
        self.set_value(key, Some(value), options)
    }

    /// Untyped `set`. `None` stands for a missing value and is stored as `""`.
    pub fn set_value(
        &mut self,
        key: &str,
        value: Option<Value>,
        options: SetOptions,
    ) -> Result<SetOutcome> {
        let physical = self.checked_key(key)?;
        let value = self.note(validate::classify_value(key, value));

        let reset = options.reset.unwrap_or(self.config.reset);
        let duration = options
            .expiry
            .filter(|d| *d != 0)
            .unwrap_or(self.config.expiry);
        let unit = options.unit.unwrap_or(self.config.unit);
        let expires_at = expiry::resolve_absolute_expiry(duration, unit, self.clock.now_ms());

        if self.read_live(&physical)?.is_some() && !reset {
            self.advise(Advisory::SetSkipped { key: physical });
            return Ok(SetOutcome::Skipped);
        }

        let entry = Entry::new(
            physical,
            value,
            reset,
            expires_at.unwrap_or(NO_EXPIRY),
            unit,
        );
        self.backend.set_item(&entry.key, &entry.encode()?, expires_at)?;
        debug!(key = %entry.key, expires_at = ?expires_at, "stored entry");
        Ok(SetOutcome::Written)
    }

    /// Live value for `key`, or `None` if absent, unreadable or expired.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        self.get_value(key)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(Into::into)
    }

    pub fn get_value(&mut self, key: &str) -> Result<Option<Value>> {
        let physical = self.checked_key(key)?;
        Ok(self.read_live(&physical)?.map(|entry| entry.value))
    }

    /// Deletes `key` whether or not it has expired.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        let physical = self.checked_key(key)?;
        self.backend.remove_item(&physical)?;
        debug!(key = %physical, "removed entry");
        Ok(())
    }

    /// Same answer as `get(key).is_some()`, eviction included.
    pub fn exists(&mut self, key: &str) -> Result<bool> {
        Ok(self.get_value(key)?.is_some())
    }

    /// Physical keys that have not expired, optionally narrowed by `filter`.
    ///
    /// Expired keys are skipped but left in the backend. A key matches a filter
    /// when it splits at the link sign at least once (twice if both prefix and
    /// suffix are given), its head equals the prefix and its tail ends with the
    /// suffix. A filter naming no field matches nothing. Keys come back in
    /// backend order.
    pub fn list_keys(&mut self, filter: Option<&KeyFilter>) -> Result<Vec<String>> {
        let now = self.clock.now_ms();
        let mut live = Vec::new();
        for key in self.backend.keys()? {
            let raw = self.backend.get_item(&key)?;
            if Entry::raw_is_live(raw.as_deref(), now) {
                live.push(key);
            }
        }

        let Some(filter) = filter else {
            return Ok(live);
        };
        if !filter.is_scoped() {
            return Ok(Vec::new());
        }

        let sign = filter
            .link_sign
            .as_deref()
            .unwrap_or(&self.config.link_sign);
        let boundaries = if filter.prefix.is_some() && filter.suffix.is_some() {
            2
        } else {
            1
        };

        live.retain(|key| {
            if !codec::has_at_least(key, sign, boundaries) {
                return false;
            }
            codec::decompose(key, sign).is_some_and(|parts| {
                filter.prefix.as_deref().is_none_or(|p| parts.head == p)
                    && filter
                        .suffix
                        .as_deref()
                        .is_none_or(|s| parts.tail_ends_with(s, sign))
            })
        });
        Ok(live)
    }

    /// `list_keys` with a filter straight from JSON. A non-object filter is
    /// an advisory and lists everything.
    pub fn list_keys_json(&mut self, filter: Option<&Value>) -> Result<Vec<String>> {
        let filter = match filter {
            None => None,
            Some(value) => match KeyFilter::from_json(value) {
                Ok(checked) => self.note(checked),
                Err(e) => return self.fatal(e),
            },
        };
        self.list_keys(filter.as_ref())
    }

    /// Removes every live key matching `filter` and returns how many went.
    ///
    /// Without a filter this flushes the whole backend. A filter naming none
    /// of prefix, suffix or link sign is refused.
    pub fn clear_matching(&mut self, filter: Option<&KeyFilter>) -> Result<usize> {
        let keys = match filter {
            None => {
                self.advise(Advisory::UnscopedClear);
                self.list_keys(None)?
            }
            Some(f) if !f.is_scoped() => return self.fatal(StoreError::UnscopedFilter),
            Some(f) => self.list_keys(Some(f))?,
        };

        for key in &keys {
            self.backend.remove_item(key)?;
        }
        debug!(removed = keys.len(), "cleared entries");
        Ok(keys.len())
    }

    /// `clear_matching` with a filter straight from JSON. Anything but an
    /// object naming at least one field is refused.
    pub fn clear_matching_json(&mut self, filter: Option<&Value>) -> Result<usize> {
        let Some(value) = filter else {
            return self.clear_matching(None);
        };
        match KeyFilter::from_json(value) {
            Ok(Validated::Clean(Some(f))) => self.clear_matching(Some(&f)),
            Ok(_) => self.fatal(StoreError::UnscopedFilter),
            Err(e) => self.fatal(e),
        }
    }

    /// Deletes every entry whose envelope has expired. Only runs when called.
    pub fn purge_expired(&mut self) -> Result<usize> {
        let now = self.clock.now_ms();
        let mut removed = 0;
        for key in self.backend.keys()? {
            let expired = self
                .backend
                .get_item(&key)?
                .and_then(|raw| Entry::decode(&raw))
                .is_some_and(|entry| entry.is_expired_at(now));
            if expired {
                self.backend.remove_item(&key)?;
                removed += 1;
            }
        }
        debug!(removed, "purged expired entries");
        Ok(removed)
    }
}
