//! Argument checks shared by every store operation.

use serde_json::Value;

use crate::error::{Advisory, Result, StoreError, Validated};
use crate::guard::{self, Kind};

/// Keys must be non-empty and free of whitespace. All-numeric keys pass with
/// an advisory.
pub fn validate_key(key: &str) -> Result<Validated<&str>> {
    if key.trim().is_empty() {
        return Err(StoreError::EmptyKey);
    }
    if key.chars().any(char::is_whitespace) {
        return Err(StoreError::KeyContainsWhitespace(key.to_string()));
    }
    if looks_numeric(key) {
        return Ok(Validated::Advisory(
            key,
            Advisory::NumericKey {
                key: key.to_string(),
            },
        ));
    }
    Ok(Validated::Clean(key))
}

/// Whether `key` reads as a number under JavaScript's `Number()` conversion:
/// decimal and exponent forms, signed `Infinity`, and unsigned `0x`/`0o`/`0b`
/// integers.
fn looks_numeric(key: &str) -> bool {
    let key = key.trim();
    let unsigned = key.strip_prefix(['+', '-']).unwrap_or(key);
    if unsigned == "Infinity" {
        return true;
    }

    let radix = match key.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &key[2..];
        return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
    }

    // rules out Rust-only spellings such as `inf` and `nan`
    unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
        && key.parse::<f64>().is_ok()
}

/// An absent value is replaced by `""`; `null` is kept but flagged.
pub fn classify_value(key: &str, value: Option<Value>) -> Validated<Value> {
    match value {
        None => Validated::Advisory(
            Value::String(String::new()),
            Advisory::UndefinedValue {
                key: key.to_string(),
            },
        ),
        Some(v) if guard::matches(Kind::Null, Some(&v)) => Validated::Advisory(
            v,
            Advisory::NullValue {
                key: key.to_string(),
            },
        ),
        Some(v) => Validated::Clean(v),
    }
}
