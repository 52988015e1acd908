use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable key for a precinct, kept in its native representation.
///
/// Integer identifiers (`GEOID10` is usually emitted as a number) stay integers so
/// the output file echoes the input's JSON types. String tokens keep their exact
/// text, leading zeros included, behind a shared `Arc<str>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrecinctId {
    Int(i64),
    Str(Arc<str>),
}

impl PrecinctId {
    /// Interpret a JSON property value as an identifier.
    /// Only integral numbers and strings qualify. Integral floats (`510010001.0`,
    /// as shapefile converters tend to write) become integers.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)).map(Self::Int),
            Value::String(s) => Some(Self::Str(Arc::from(s.as_str()))),
            _ => None,
        }
    }

    /// Recover an identifier from a JSON object key.
    ///
    /// Keys are always strings, so a key is read as an integer exactly when it is
    /// the canonical decimal form of an `i64` (what `Display` writes for `Int`).
    pub fn from_key(key: &str) -> Self {
        match key.parse::<i64>() {
            Ok(n) if n.to_string() == key => Self::Int(n),
            _ => Self::Str(Arc::from(key)),
        }
    }
}

/// `x` as an `i64` if it is a whole number in range.
fn integral(x: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    (x.is_finite() && x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64)
        .then_some(x as i64)
}

impl fmt::Display for PrecinctId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PrecinctId {
    fn from(n: i64) -> Self { Self::Int(n) }
}

impl From<i32> for PrecinctId {
    fn from(n: i32) -> Self { Self::Int(n as i64) }
}

impl From<&str> for PrecinctId {
    fn from(s: &str) -> Self { Self::Str(Arc::from(s)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_accepts_integers_and_strings() {
        assert_eq!(PrecinctId::from_json(&json!(42)), Some(PrecinctId::Int(42)));
        assert_eq!(PrecinctId::from_json(&json!("0042")), Some(PrecinctId::from("0042")));
        assert_eq!(PrecinctId::from_json(&json!(4.5)), None);
        assert_eq!(PrecinctId::from_json(&json!(510010001.0)), Some(PrecinctId::Int(510010001)));
        assert_eq!(PrecinctId::from_json(&json!(-3.0)), Some(PrecinctId::Int(-3)));
        assert_eq!(PrecinctId::from_json(&json!(1e300)), None);
        assert_eq!(PrecinctId::from_json(&json!(u64::MAX)), None);
        assert_eq!(PrecinctId::from_json(&json!(null)), None);
        assert_eq!(PrecinctId::from_json(&json!([1])), None);
    }

    #[test]
    fn key_parsing_only_accepts_canonical_integers() {
        assert_eq!(PrecinctId::from_key("510010001"), PrecinctId::Int(510010001));
        assert_eq!(PrecinctId::from_key("-7"), PrecinctId::Int(-7));
        assert_eq!(PrecinctId::from_key("0042"), PrecinctId::from("0042"));
        assert_eq!(PrecinctId::from_key("+42"), PrecinctId::from("+42"));
        assert_eq!(PrecinctId::from_key("Ward 3"), PrecinctId::from("Ward 3"));
    }

    #[test]
    fn display_round_trips_through_key() {
        for id in [PrecinctId::Int(-12), PrecinctId::Int(0), PrecinctId::from("01-A")] {
            assert_eq!(PrecinctId::from_key(&id.to_string()), id);
        }
    }

    #[test]
    fn serializes_in_native_json_type() {
        assert_eq!(serde_json::to_value(PrecinctId::Int(7)).unwrap(), json!(7));
        assert_eq!(serde_json::to_value(PrecinctId::from("7a")).unwrap(), json!("7a"));
    }
}
