//! Runtime kind checks for untyped input.
//!
//! Only the JSON entry points (`StoreConfig::from_json`, `SetOptions::from_json`,
//! `KeyFilter::from_json`) and the value classification in `set_value` use this.
//! Everything past that boundary is typed.

use chrono::DateTime;
use serde_json::Value;

/// The closed set of kinds a caller-supplied value can be checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    /// A number that is not NaN.
    Number,
    Boolean,
    /// A plain JSON object.
    Object,
    Array,
    /// A string holding an RFC 3339 timestamp.
    Date,
    Null,
    NaN,
    /// No value at all.
    Undefined,
}

impl Kind {
    /// Name used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::Object => "an object",
            Self::Array => "an array",
            Self::Date => "a date",
            Self::Null => "null",
            Self::NaN => "NaN",
            Self::Undefined => "undefined",
        }
    }
}

/// Returns true when `value` is of the given kind. `None` stands for an absent value.
///
/// `Date` and `String` overlap: an RFC 3339 string matches both.
pub fn matches(kind: Kind, value: Option<&Value>) -> bool {
    match (kind, value) {
        (Kind::Undefined, None) => true,
        (_, None) => false,
        (Kind::String, Some(Value::String(_))) => true,
        (Kind::Number, Some(Value::Number(n))) => n.as_f64().is_some_and(|f| !f.is_nan()),
        (Kind::NaN, Some(Value::Number(n))) => n.as_f64().is_some_and(f64::is_nan),
        (Kind::Boolean, Some(Value::Bool(_))) => true,
        (Kind::Object, Some(Value::Object(_))) => true,
        (Kind::Array, Some(Value::Array(_))) => true,
        (Kind::Date, Some(Value::String(s))) => DateTime::parse_from_rfc3339(s).is_ok(),
        (Kind::Null, Some(Value::Null)) => true,
        _ => false,
    }
}

/// The most specific kind of `value`.
pub fn kind_of(value: Option<&Value>) -> Kind {
    [
        Kind::Undefined,
        Kind::Null,
        Kind::Boolean,
        Kind::NaN,
        Kind::Number,
        Kind::Date,
        Kind::String,
        Kind::Array,
        Kind::Object,
    ]
    .into_iter()
    .find(|kind| matches(*kind, value))
    .unwrap_or(Kind::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_kinds() {
        assert!(matches(Kind::String, Some(&json!("a"))));
        assert!(matches(Kind::Number, Some(&json!(1.5))));
        assert!(matches(Kind::Boolean, Some(&json!(false))));
        assert!(matches(Kind::Null, Some(&Value::Null)));
        assert!(matches(Kind::Undefined, None));

        assert!(!matches(Kind::Number, Some(&json!("1"))));
        assert!(!matches(Kind::String, None));
        assert!(!matches(Kind::Undefined, Some(&Value::Null)));
    }

    #[test]
    fn test_number_is_not_nan() {
        let n = json!(42);
        assert!(matches(Kind::Number, Some(&n)));
        assert!(!matches(Kind::NaN, Some(&n)));
    }

    #[test]
    fn test_object_and_array_are_distinct() {
        let obj = json!({"id": 1});
        let arr = json!([1, 2]);
        assert!(matches(Kind::Object, Some(&obj)));
        assert!(!matches(Kind::Array, Some(&obj)));
        assert!(matches(Kind::Array, Some(&arr)));
        assert!(!matches(Kind::Object, Some(&arr)));
    }

    #[test]
    fn test_date_strings() {
        let date = json!("2024-03-01T10:00:00Z");
        assert!(matches(Kind::Date, Some(&date)));
        assert!(matches(Kind::String, Some(&date)));
        assert!(!matches(Kind::Date, Some(&json!("yesterday"))));
        assert_eq!(kind_of(Some(&date)), Kind::Date);
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(kind_of(None), Kind::Undefined);
        assert_eq!(kind_of(Some(&Value::Null)), Kind::Null);
        assert_eq!(kind_of(Some(&json!("x"))), Kind::String);
        assert_eq!(kind_of(Some(&json!(3))), Kind::Number);
        assert_eq!(kind_of(Some(&json!({}))), Kind::Object);
    }
}
