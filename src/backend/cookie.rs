//! Cookie wire format: `name=value; path=/; expires=<HTTP-date>; ...`.
//!
//! Names and values are percent-encoded like `encodeURIComponent`, with the
//! characters cookies tolerate left readable.

use chrono::{DateTime, NaiveDateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Left alone by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Name characters kept readable. Parentheses are escaped again.
const NAME: &AsciiSet = &URI_COMPONENT
    .add(b'(')
    .add(b')')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'^')
    .remove(b'`')
    .remove(b'|');

const VALUE: &AsciiSet = &URI_COMPONENT
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'/')
    .remove(b':')
    .remove(b'<')
    .remove(b'=')
    .remove(b'>')
    .remove(b'?')
    .remove(b'@')
    .remove(b'[')
    .remove(b']')
    .remove(b'^')
    .remove(b'`')
    .remove(b'{')
    .remove(b'|')
    .remove(b'}');

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub fn encode_name(name: &str) -> String {
    utf8_percent_encode(name, NAME).to_string()
}

pub fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, VALUE).to_string()
}

pub fn decode_name(name: &str) -> Option<String> {
    percent_decode_str(name)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// Strips one pair of surrounding double quotes, then percent-decodes.
pub fn decode_value(value: &str) -> Option<String> {
    let unquoted = match value.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').unwrap_or(rest),
        None => value,
    };
    decode_name(unquoted)
}

/// RFC 1123 date for a millisecond timestamp, rounded up to the next whole
/// second so the cookie never dies before the envelope it carries. `None`
/// past the last representable date.
pub fn http_date(ms: i64) -> Option<String> {
    let secs = ms.div_euclid(1000) + i64::from(ms.rem_euclid(1000) != 0);
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.format(HTTP_DATE).to_string())
}

pub(crate) fn parse_http_date(s: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(s.trim(), HTTP_DATE)
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Attributes written after `name=value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub path: String,
    /// Absolute expiry in ms; rendered as `expires=<HTTP-date>`.
    pub expires: Option<i64>,
    /// Further attributes in order. `None` renders a bare flag (`secure`).
    pub extra: Vec<(String, Option<String>)>,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            expires: None,
            extra: Vec::new(),
        }
    }
}

impl CookieAttributes {
    pub fn with(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.extra.push((name.into(), value));
        self
    }

    /// `; path=/; expires=...; secure`. Empty values are skipped and a value is
    /// cut at its first `;`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut push = |name: &str, value: Option<&str>| match value {
            None => {
                out.push_str("; ");
                out.push_str(name);
            }
            Some(v) if v.is_empty() => {}
            Some(v) => {
                out.push_str("; ");
                out.push_str(name);
                out.push('=');
                out.push_str(v.split(';').next().unwrap_or_default());
            }
        };

        push("path", Some(&self.path));
        // out of range renders no expires, leaving a session cookie
        if let Some(date) = self.expires.and_then(http_date) {
            push("expires", Some(&date));
        }
        for (name, value) in &self.extra {
            push(name, value.as_deref());
        }
        out
    }
}

/// One set-cookie line.
pub(crate) fn serialize(name: &str, value: &str, attributes: &CookieAttributes) -> String {
    format!("{}={}{}", encode_name(name), encode_value(value), attributes.render())
}

/// Parses a `name=value; name=value` header into decoded pairs, in order.
/// Pairs that fail to decode are dropped.
pub fn parse_header(header: &str) -> Vec<(String, String)> {
    if header.is_empty() {
        return Vec::new();
    }
    header
        .split("; ")
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            Some((decode_name(name)?, decode_value(value)?))
        })
        .collect()
}
