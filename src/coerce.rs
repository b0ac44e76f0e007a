//! Centralized coercion for loosely-typed JSON inputs.
//!
//! Clients send numeric fields as numbers or strings interchangeably, so the
//! handlers coerce before anything reaches the store. The rules match the
//! existing API contract: an unparseable or zero value falls back to the
//! entity default.

use serde_json::Value;

/// Coerces a JSON number or numeric string to `i64`.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Coercion with fallback: `None`, unparseable, and zero all yield
/// `default`. Used for testimonial ratings (default 5) and display order
/// (default 0).
pub fn int_or(value: Option<&Value>, default: i64) -> i64 {
    match value.and_then(as_int) {
        Some(0) | None => default,
        Some(n) => n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_coerce() {
        assert_eq!(as_int(&json!(4)), Some(4));
        assert_eq!(as_int(&json!("7")), Some(7));
        assert_eq!(as_int(&json!(" 3 ")), Some(3));
        assert_eq!(as_int(&json!("seven")), None);
        assert_eq!(as_int(&json!(null)), None);
    }

    #[test]
    fn rating_defaults_on_zero_and_garbage() {
        assert_eq!(int_or(Some(&json!(4)), 5), 4);
        assert_eq!(int_or(Some(&json!("2")), 5), 2);
        assert_eq!(int_or(Some(&json!(0)), 5), 5);
        assert_eq!(int_or(Some(&json!("not a number")), 5), 5);
        assert_eq!(int_or(None, 5), 5);
    }
}
