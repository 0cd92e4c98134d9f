use std::sync::Arc;

use tracing::trace;

use super::cookie::{self, CookieAttributes, parse_header, parse_http_date};
use super::{Backend, BackendKind};
use crate::error::Result;
use crate::expiry::{Clock, SystemClock};

/// The environment that owns the cookie string, e.g. `document.cookie`.
pub trait CookieHost {
    /// Current `name=value; name=value` header of live cookies.
    fn read(&self) -> String;

    /// Applies one set-cookie line.
    fn write(&mut self, line: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredCookie {
    name: String,
    value: String,
    expires: Option<i64>,
}

/// In-process cookie jar with `document.cookie` semantics: writes take a
/// set-cookie line, reads return only cookies that have not expired.
#[derive(Clone)]
pub struct MemoryCookieJar {
    cookies: Vec<StoredCookie>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryCookieJar {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            cookies: Vec::new(),
            clock,
        }
    }

    /// Cookies held, including expired ones not yet pruned.
    pub fn stored_len(&self) -> usize {
        self.cookies.len()
    }

    fn expiry_of(&self, attributes: &str, now: i64) -> Option<i64> {
        let mut expires = None;
        for attr in attributes.split(';') {
            let (name, value) = attr.split_once('=').unwrap_or((attr, ""));
            match name.trim().to_ascii_lowercase().as_str() {
                "expires" => expires = parse_http_date(value).or(expires),
                // max-age wins over expires
                "max-age" => {
                    if let Ok(secs) = value.trim().parse::<i64>() {
                        return Some(now.saturating_add(secs.saturating_mul(1000)));
                    }
                }
                _ => {}
            }
        }
        expires
    }
}

impl CookieHost for MemoryCookieJar {
    fn read(&self) -> String {
        let now = self.clock.now_ms();
        self.cookies
            .iter()
            .filter(|c| c.expires.is_none_or(|at| at > now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn write(&mut self, line: &str) {
        let now = self.clock.now_ms();
        let (pair, attributes) = line.split_once(';').unwrap_or((line, ""));
        let (name, value) = pair.split_once('=').unwrap_or(("", pair));
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let expires = self.expiry_of(attributes, now);
        self.cookies.retain(|c| c.expires.is_none_or(|at| at > now));

        let position = self.cookies.iter().position(|c| c.name == name);
        if expires.is_some_and(|at| at <= now) {
            if let Some(i) = position {
                self.cookies.remove(i);
            }
            return;
        }

        let cookie = StoredCookie {
            name: name.to_string(),
            value: value.trim().to_string(),
            expires,
        };
        match position {
            Some(i) => self.cookies[i] = cookie,
            None => self.cookies.push(cookie),
        }
    }
}

/// Backend over a cookie host. Each entry is one cookie; the envelope is the
/// percent-encoded cookie value and the entry's expiry is also set as the
/// cookie's own `expires`, so the host drops it on its own.
pub struct RecordJar<H: CookieHost> {
    host: H,
    attributes: CookieAttributes,
}

impl<H: CookieHost> RecordJar<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            attributes: CookieAttributes::default(),
        }
    }

    /// Attributes written with every cookie (path, domain, secure, ...).
    /// `expires` is replaced per entry.
    pub fn with_attributes(mut self, attributes: CookieAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn write(&mut self, key: &str, value: &str, expires: Option<i64>) {
        let attributes = CookieAttributes {
            expires,
            ..self.attributes.clone()
        };
        let line = cookie::serialize(key, value, &attributes);
        trace!(line = %line, "writing cookie");
        self.host.write(&line);
    }
}

impl<H: CookieHost> Backend for RecordJar<H> {
    fn kind(&self) -> BackendKind {
        BackendKind::RecordJar
    }

    fn set_item(&mut self, key: &str, value: &str, expires_at: Option<i64>) -> Result<()> {
        self.write(key, value, expires_at);
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(parse_header(&self.host.read())
            .into_iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value))
    }

    /// Overwrites with an empty value that expired a millisecond before the epoch.
    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.write(key, "", Some(-1));
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(parse_header(&self.host.read())
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expiry::ManualClock;

    fn jar(clock: &ManualClock) -> RecordJar<MemoryCookieJar> {
        RecordJar::new(MemoryCookieJar::new(Arc::new(clock.clone())))
    }

    #[test]
    fn test_set_get_remove() {
        let clock = ManualClock::new(1_000_000);
        let mut jar = jar(&clock);

        jar.set_item("app.user", r#"{"id":1}"#, None).unwrap();
        assert_eq!(jar.host().read(), "app.user={%22id%22:1}");
        assert_eq!(jar.get_item("app.user").unwrap().as_deref(), Some(r#"{"id":1}"#));

        jar.remove_item("app.user").unwrap();
        assert!(jar.get_item("app.user").unwrap().is_none());
        assert_eq!(jar.host().stored_len(), 0);
    }

    #[test]
    fn test_keys_keep_write_order() {
        let clock = ManualClock::new(0);
        let mut jar = jar(&clock);
        jar.set_item("b", "1", None).unwrap();
        jar.set_item("a", "2", None).unwrap();
        jar.set_item("b", "3", None).unwrap();
        assert_eq!(jar.keys().unwrap(), vec!["b", "a"]);
        assert_eq!(jar.get_item("b").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_native_expiry() {
        let clock = ManualClock::new(1_000_000);
        let mut jar = jar(&clock);
        jar.set_item("short", "x", Some(1_000_010)).unwrap();
        jar.set_item("long", "y", None).unwrap();

        assert!(jar.get_item("short").unwrap().is_some());
        clock.advance(1_000);
        assert!(jar.get_item("short").unwrap().is_none());
        assert_eq!(jar.keys().unwrap(), vec!["long"]);
    }

    #[test]
    fn test_memory_jar_max_age() {
        let clock = ManualClock::new(0);
        let mut host = MemoryCookieJar::new(Arc::new(clock.clone()));
        host.write("a=1; path=/; max-age=2");
        assert_eq!(host.read(), "a=1");
        clock.advance(2_000);
        assert_eq!(host.read(), "");

        host.write("b=2; max-age=0");
        assert_eq!(host.stored_len(), 0);
    }

    #[test]
    fn test_custom_attributes_are_written() {
        struct Recorder(Vec<String>);
        impl CookieHost for Recorder {
            fn read(&self) -> String {
                String::new()
            }
            fn write(&mut self, line: &str) {
                self.0.push(line.to_string());
            }
        }

        let attrs = CookieAttributes::default().with("secure", None);
        let mut jar = RecordJar::new(Recorder(Vec::new())).with_attributes(attrs);
        jar.set_item("k", "v", Some(1_000)).unwrap();
        assert_eq!(
            jar.host().0,
            vec!["k=v; path=/; expires=Thu, 01 Jan 1970 00:00:01 GMT; secure"]
        );
    }
}
