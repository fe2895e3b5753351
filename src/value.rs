//! Shared predicates and coercions over dynamic JSON values.
//!
//! The form compiler, wizard gating and generation cleaner all need to agree
//! on what counts as a "filled" value and how loose provider output maps onto
//! the typed field model, so those rules live here.

use serde_json::Value;

/// A value is empty when a user has not meaningfully provided it.
///
/// Blank strings, empty lists, lists of blank strings, `null` and the number
/// zero all count as empty. Booleans never count as empty: a toggle that was
/// left at `false` is indistinguishable from one deliberately set to `false`.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => !items.iter().any(|item| match item {
            Value::String(s) => !s.trim().is_empty(),
            Value::Null => false,
            _ => true,
        }),
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::Bool(_) => false,
        Value::Object(map) => map.is_empty(),
    }
}

/// Loose truthiness for boolean coercion of provider output.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => {
            let s = s.trim();
            match s.to_ascii_lowercase().as_str() {
                "" | "false" | "no" | "0" => false,
                _ => true,
            }
        }
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Render any JSON value as trimmed text for a textual field.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Structured values are kept readable rather than dropped.
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Parse a value as a number, `0` when it cannot be read as one.
pub(crate) fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Build a JSON number, preferring integer representation when exact.
pub(crate) fn number_value(n: f64) -> Value {
    if !n.is_finite() {
        return Value::from(0);
    }
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(0))
    }
}

/// Try to read a value as a number without defaulting; used where failure
/// must surface as a validation error instead of a silent zero.
pub(crate) fn try_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_detection() {
        assert!(is_empty(&json!(null)));
        assert!(is_empty(&json!("")));
        assert!(is_empty(&json!("   ")));
        assert!(is_empty(&json!([])));
        assert!(is_empty(&json!(["", "  "])));
        assert!(is_empty(&json!(0)));
        assert!(!is_empty(&json!("Aria")));
        assert!(!is_empty(&json!(["brave"])));
        assert!(!is_empty(&json!(42)));
        assert!(!is_empty(&json!(false)));
    }

    #[test]
    fn truthiness() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!("yes")));
        assert!(!truthy(&json!("false")));
        assert!(!truthy(&json!("No")));
        assert!(!truthy(&json!(0)));
        assert!(truthy(&json!(2)));
    }

    #[test]
    fn number_value_prefers_integers() {
        assert_eq!(number_value(3.0), json!(3));
        assert_eq!(number_value(2.5), json!(2.5));
        assert_eq!(number_value(f64::NAN), json!(0));
    }

    #[test]
    fn stringify_structured() {
        assert_eq!(stringify(&json!("  hi ")), "hi");
        assert_eq!(stringify(&json!(7)), "7");
        assert_eq!(stringify(&json!(null)), "");
    }
}
