//! Error and advisory types for store operations.

use std::io;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Fatal errors. Each one aborts the current call before the backend is touched.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Backend kind was missing or not one of durable / session / record-jar.
    #[error("unknown backend kind: {0:?}")]
    UnknownBackend(String),

    /// Key was empty or only whitespace.
    #[error("the key cannot be empty")]
    EmptyKey,

    /// Key contained a space, tab or other whitespace.
    #[error("the key cannot contain whitespace: {0:?}")]
    KeyContainsWhitespace(String),

    /// An optional parameter was supplied with the wrong type.
    #[error("parameter '{name}' must be {expected}")]
    InvalidParameter {
        name: &'static str,
        expected: &'static str,
    },

    /// Expiry durations are whole numbers.
    #[error("the expiry duration cannot be fractional: {0}")]
    FractionalExpiry(f64),

    /// Duration unit outside ms / s / min / h / d / w / m / y.
    #[error("unknown time unit {0:?}, expected one of ms, s, min, h, d, w, m, y")]
    UnknownTimeUnit(String),

    /// A clear filter named none of prefix, suffix or linkSign.
    #[error("refusing to clear with a filter that names no prefix, suffix or linkSign")]
    UnscopedFilter,

    /// File system failure in the durable backend.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Envelope or value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Browser storage host failure (wasm only).
    #[cfg(feature = "wasm")]
    #[error("web storage error: {0}")]
    WebStorage(String),
}

impl StoreError {
    pub(crate) fn invalid(name: &'static str, expected: &'static str) -> Self {
        Self::InvalidParameter { name, expected }
    }
}

/// Non-fatal conditions. The operation goes on with a substituted or unmodified value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// `set` got no value; an empty string was stored instead.
    UndefinedValue { key: String },
    /// `set` got a null value; it is stored as-is.
    NullValue { key: String },
    /// The key looks like a number.
    NumericKey { key: String },
    /// A live entry exists and the reset policy was false, so nothing was written.
    SetSkipped { key: String },
    /// A key filter was not an object; the unfiltered key list was used.
    MalformedFilter,
    /// The entry had expired and was evicted on read.
    Expired { key: String },
    /// `clear_matching` ran without a filter and flushed the whole backend.
    UnscopedClear,
}

impl core::fmt::Display for Advisory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UndefinedValue { key } => {
                write!(f, "value for {key:?} was undefined, storing an empty string")
            }
            Self::NullValue { key } => write!(f, "value for {key:?} is null"),
            Self::NumericKey { key } => write!(f, "key {key:?} should not be all digits"),
            Self::SetSkipped { key } => {
                write!(f, "{key:?} already holds a live value and reset is off, not overwritten")
            }
            Self::MalformedFilter => write!(
                f,
                "key filter must be an object like {{prefix, suffix, linkSign}}, returning all keys"
            ),
            Self::Expired { key } => write!(f, "{key:?} has expired and was removed"),
            Self::UnscopedClear => write!(f, "clearing every key in this backend"),
        }
    }
}

/// Outcome of a check that passed, possibly with an advisory attached.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated<T> {
    Clean(T),
    Advisory(T, Advisory),
}

impl<T> Validated<T> {
    /// Splits into the value and the optional advisory.
    pub fn into_parts(self) -> (T, Option<Advisory>) {
        match self {
            Self::Clean(v) => (v, None),
            Self::Advisory(v, a) => (v, Some(a)),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Clean(v) | Self::Advisory(v, _) => v,
        }
    }

    pub fn advisory(&self) -> Option<&Advisory> {
        match self {
            Self::Clean(_) => None,
            Self::Advisory(_, a) => Some(a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::invalid("isReset", "a boolean");
        assert_eq!(err.to_string(), "parameter 'isReset' must be a boolean");

        let err = StoreError::UnknownTimeUnit("days".into());
        assert!(err.to_string().contains("\"days\""));
    }

    #[test]
    fn test_validated_parts() {
        let v = Validated::Advisory(1, Advisory::MalformedFilter);
        assert_eq!(v.value(), &1);
        assert_eq!(v.advisory(), Some(&Advisory::MalformedFilter));
        assert_eq!(v.into_parts(), (1, Some(Advisory::MalformedFilter)));

        let v = Validated::Clean("a");
        assert!(v.advisory().is_none());
    }
}
