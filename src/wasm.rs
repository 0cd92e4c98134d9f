//! Browser hosts and the JavaScript-facing store wrapper.

use std::sync::Arc;

use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::backend::{Backend, BackendKind, CookieHost, RecordJar};
use crate::config::{SetOptions, StoreConfig};
use crate::error::{Result, StoreError};
use crate::expiry::Clock;
use crate::store::{SetOutcome, Store};

#[wasm_bindgen]
extern "C" {
    type Storage;

    #[wasm_bindgen(thread_local_v2, js_name = localStorage)]
    static LOCAL_STORAGE: Storage;

    #[wasm_bindgen(thread_local_v2, js_name = sessionStorage)]
    static SESSION_STORAGE: Storage;

    #[wasm_bindgen(method, js_name = getItem)]
    fn get_item(this: &Storage, key: &str) -> Option<String>;

    #[wasm_bindgen(method, catch, js_name = setItem)]
    fn set_item(this: &Storage, key: &str, value: &str) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = removeItem)]
    fn remove_item(this: &Storage, key: &str);

    #[wasm_bindgen(method)]
    fn key(this: &Storage, index: u32) -> Option<String>;

    type Document;

    #[wasm_bindgen(thread_local_v2, js_name = document)]
    static DOCUMENT: Document;

    #[wasm_bindgen(method, getter)]
    fn cookie(this: &Document) -> String;

    #[wasm_bindgen(method, setter)]
    fn set_cookie(this: &Document, line: &str);

    #[wasm_bindgen(js_name = "Date.now")]
    fn date_now() -> f64;
}

/// `Date.now()` as a [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DateClock;

impl Clock for DateClock {
    fn now_ms(&self) -> i64 {
        date_now() as i64
    }
}

/// `localStorage` or `sessionStorage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebStorage {
    Local,
    Session,
}

impl WebStorage {
    fn with<R>(self, f: impl FnOnce(&Storage) -> R) -> R {
        match self {
            Self::Local => LOCAL_STORAGE.with(f),
            Self::Session => SESSION_STORAGE.with(f),
        }
    }
}

impl Backend for WebStorage {
    fn kind(&self) -> BackendKind {
        match self {
            Self::Local => BackendKind::Durable,
            Self::Session => BackendKind::Session,
        }
    }

    fn set_item(&mut self, key: &str, value: &str, _expires_at: Option<i64>) -> Result<()> {
        self.with(|s| s.set_item(key, value))
            .map_err(|e| StoreError::WebStorage(format!("{e:?}")))
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.with(|s| s.get_item(key)))
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.with(|s| s.remove_item(key));
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.with(|s| (0..).map_while(|i| s.key(i)).collect()))
    }
}

/// `document.cookie`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCookie;

impl CookieHost for DocumentCookie {
    fn read(&self) -> String {
        DOCUMENT.with(Document::cookie)
    }

    fn write(&mut self, line: &str) {
        DOCUMENT.with(|d| d.set_cookie(line));
    }
}

/// Builds a store over the browser host for `kind`.
pub fn create_web_store(kind: &str, config: StoreConfig) -> Result<Store> {
    let backend: Box<dyn Backend> = match kind.parse::<BackendKind>()? {
        BackendKind::Durable => Box::new(WebStorage::Local),
        BackendKind::Session => Box::new(WebStorage::Session),
        BackendKind::RecordJar => Box::new(RecordJar::new(DocumentCookie)),
    };
    Ok(Store::from_boxed(backend, config).with_clock(Arc::new(DateClock)))
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_json(text: Option<String>) -> std::result::Result<Option<Value>, JsValue> {
    text.map(|t| serde_json::from_str(&t)).transpose().map_err(js_err)
}

/// Store handle for JavaScript. Values cross the boundary as JSON text.
#[wasm_bindgen]
pub struct StoreWasm {
    inner: Store,
}

#[wasm_bindgen]
impl StoreWasm {
    /// `kind` is `local`, `session` or `cookie`; `config` is optional JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(kind: &str, config: Option<String>) -> std::result::Result<StoreWasm, JsValue> {
        let config = match parse_json(config)? {
            Some(value) => StoreConfig::from_json(&value).map_err(js_err)?,
            None => StoreConfig::default(),
        };
        create_web_store(kind, config)
            .map(|inner| StoreWasm { inner })
            .map_err(js_err)
    }

    /// Returns false when an existing live value was kept.
    #[wasm_bindgen(js_name = "set")]
    pub fn set(
        &mut self,
        key: &str,
        value: Option<String>,
        options: Option<String>,
    ) -> std::result::Result<bool, JsValue> {
        let value = parse_json(value)?;
        let options = match parse_json(options)? {
            Some(v) => SetOptions::from_json(&v).map_err(js_err)?,
            None => SetOptions::default(),
        };
        self.inner
            .set_value(key, value, options)
            .map(|outcome| outcome == SetOutcome::Written)
            .map_err(js_err)
    }

    /// The stored value as JSON text.
    #[wasm_bindgen(js_name = "get")]
    pub fn get(&mut self, key: &str) -> std::result::Result<Option<String>, JsValue> {
        self.inner
            .get_value(key)
            .map(|v| v.map(|v| v.to_string()))
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = "remove")]
    pub fn remove(&mut self, key: &str) -> std::result::Result<(), JsValue> {
        self.inner.remove(key).map_err(js_err)
    }

    #[wasm_bindgen(js_name = "exists")]
    pub fn exists(&mut self, key: &str) -> std::result::Result<bool, JsValue> {
        self.inner.exists(key).map_err(js_err)
    }

    #[wasm_bindgen(js_name = "listKeys")]
    pub fn list_keys(
        &mut self,
        filter: Option<String>,
    ) -> std::result::Result<Vec<String>, JsValue> {
        let filter = parse_json(filter)?;
        self.inner.list_keys_json(filter.as_ref()).map_err(js_err)
    }

    #[wasm_bindgen(js_name = "clearMatching")]
    pub fn clear_matching(&mut self, filter: Option<String>) -> std::result::Result<u32, JsValue> {
        let filter = parse_json(filter)?;
        self.inner
            .clear_matching_json(filter.as_ref())
            .map(|n| n as u32)
            .map_err(js_err)
    }

    /// Advisories raised since the last call, as messages.
    #[wasm_bindgen(js_name = "takeAdvisories")]
    pub fn take_advisories(&mut self) -> Vec<String> {
        self.inner
            .take_advisories()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}
