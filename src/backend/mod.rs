//! Physical storage behind a store.
//!
//! A backend only moves strings around: the store hands it an encoded envelope
//! under a physical key and reads it back. Expiry is the store's business,
//! except for backends with their own native expiration (the record jar), which
//! receive the absolute expiry as a hint.

mod cookie;
mod durable;
mod jar;
mod session;

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};

pub use cookie::{
    CookieAttributes, decode_name, decode_value, encode_name, encode_value, http_date,
    parse_header,
};
pub use durable::DurableBackend;
pub use jar::{CookieHost, MemoryCookieJar, RecordJar};
pub use session::SessionBackend;

/// Which kind of storage a store is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Survives restarts (`localStorage`, or a JSON file natively).
    Durable,
    /// Lives as long as the session (`sessionStorage`, or process memory).
    Session,
    /// Small text records with native expiry (cookies).
    RecordJar,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Durable => "durable",
            Self::Session => "session",
            Self::RecordJar => "record-jar",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "durable" | "local" => Ok(Self::Durable),
            "session" => Ok(Self::Session),
            "record-jar" | "cookie" => Ok(Self::RecordJar),
            _ => Err(StoreError::UnknownBackend(s.to_string())),
        }
    }
}

/// Uniform get/set/remove/enumerate contract over a physical store.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Stores `value` under `key`. `expires_at` (ms since epoch) is only used by
    /// backends that expire entries natively.
    fn set_item(&mut self, key: &str, value: &str, expires_at: Option<i64>) -> Result<()>;

    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn remove_item(&mut self, key: &str) -> Result<()>;

    /// Every physical key currently held, in the backend's own order.
    fn keys(&self) -> Result<Vec<String>>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn kind(&self) -> BackendKind {
        (**self).kind()
    }

    fn set_item(&mut self, key: &str, value: &str, expires_at: Option<i64>) -> Result<()> {
        (**self).set_item(key, value, expires_at)
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_aliases() {
        assert_eq!("durable".parse::<BackendKind>().unwrap(), BackendKind::Durable);
        assert_eq!("local".parse::<BackendKind>().unwrap(), BackendKind::Durable);
        assert_eq!(" session ".parse::<BackendKind>().unwrap(), BackendKind::Session);
        assert_eq!("cookie".parse::<BackendKind>().unwrap(), BackendKind::RecordJar);
        assert_eq!("record-jar".parse::<BackendKind>().unwrap(), BackendKind::RecordJar);
    }

    #[test]
    fn test_unknown_kind() {
        assert!(matches!("".parse::<BackendKind>(), Err(StoreError::UnknownBackend(_))));
        assert!(matches!("Local".parse::<BackendKind>(), Err(StoreError::UnknownBackend(_))));
    }
}
