//! # nskv
//!
//! A thin key-value facade over three kinds of storage (durable, session and
//! a cookie-style record jar) with key namespacing and per-entry expiry.
//!
//! ## Features
//!
//! - Keys decorated as `prefix.key.suffix` with a configurable link sign
//! - Values stored as JSON envelopes carrying an absolute expiry
//! - Lazy expiry: entries are evicted when read, never in the background
//! - Namespace filters for listing and bulk removal
//! - Browser `localStorage` / `sessionStorage` / `document.cookie` hosts with the `wasm` feature
//!
//! ## Example
//!
//! ```rust
//! use nskv::{KeyFilter, SetOptions, StoreConfig, TimeUnit, create_store};
//! use serde_json::json;
//!
//! let config = StoreConfig::default().with_prefix("app").with_suffix("v1");
//! let mut store = create_store("session", config).unwrap();
//!
//! store.set("user", json!({"id": 1})).unwrap();
//! store
//!     .set_with("token", "abc", SetOptions::new().expire_in(30, TimeUnit::Min))
//!     .unwrap();
//!
//! let user: Option<serde_json::Value> = store.get("user").unwrap();
//! assert_eq!(user, Some(json!({"id": 1})));
//!
//! let keys = store.list_keys(Some(&KeyFilter::new().prefix("app"))).unwrap();
//! assert_eq!(keys, vec!["app.token.v1", "app.user.v1"]);
//! ```

use std::sync::Arc;

use serde_json::Value;

pub mod backend;
pub mod codec;
pub mod config;
pub mod entry;
pub mod error;
pub mod expiry;
pub mod guard;
mod store;
pub mod validate;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use backend::{
    Backend, BackendKind, CookieAttributes, CookieHost, DurableBackend, MemoryCookieJar,
    RecordJar, SessionBackend,
};
pub use config::{KeyFilter, SetOptions, StoreConfig};
pub use entry::Entry;
pub use error::{Advisory, Result, StoreError, Validated};
pub use expiry::{Clock, ManualClock, NO_EXPIRY, SystemClock, TimeUnit};
pub use store::{SetOutcome, Store};

/// Builds a store over the default backend for `kind`
/// (`durable`/`local`, `session`, `record-jar`/`cookie`).
pub fn create_store(kind: &str, config: StoreConfig) -> Result<Store> {
    create_store_with_clock(kind, config, Arc::new(SystemClock))
}

/// `create_store` with an explicit clock, shared by the store and the cookie jar.
pub fn create_store_with_clock(
    kind: &str,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
) -> Result<Store> {
    let kind = match kind.parse::<BackendKind>() {
        Ok(kind) => kind,
        Err(e) => {
            tracing::error!("{e}");
            return Err(e);
        }
    };

    let backend: Box<dyn Backend> = match kind {
        BackendKind::Durable => {
            let backend = match &config.path {
                Some(path) => DurableBackend::open(path)?,
                None => DurableBackend::in_memory(),
            };
            let backend = backend.with_backup(config.backup);
            if config.auto_save {
                Box::new(backend.with_auto_save())
            } else {
                Box::new(backend)
            }
        }
        BackendKind::Session => Box::new(SessionBackend::new()),
        BackendKind::RecordJar => Box::new(RecordJar::new(MemoryCookieJar::new(clock.clone()))),
    };

    tracing::debug!(
        backend = %kind,
        prefix = %config.prefix,
        suffix = %config.suffix,
        "created store"
    );
    Ok(Store::from_boxed(backend, config).with_clock(clock))
}

/// `create_store` with the config given as untyped JSON (`None` for defaults).
pub fn create_store_from_json(kind: &str, config: Option<&Value>) -> Result<Store> {
    let config = match config {
        Some(value) => StoreConfig::from_json(value)?,
        None => StoreConfig::default(),
    };
    create_store(kind, config)
}
