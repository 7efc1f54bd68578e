//! Number formatting that matches how JavaScript prints numbers.
//!
//! Dataset coercion only turns an attribute into a number when printing the
//! parsed number gives back the exact attribute text, so `"23"` becomes
//! `23` while `"1E10"`, `"01"` and `"1.50"` stay strings.

use serde_json::{Number, Value};

/// Formats a number the way `String(n)` does in JavaScript.
#[must_use]
pub fn js_number_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{n}");
    }
    let formatted = format!("{n:e}");
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => formatted,
    }
}

/// Parses `raw` as a number if it round-trips through JavaScript formatting.
#[must_use]
pub fn parse_exact_number(raw: &str) -> Option<Value> {
    let n: f64 = raw.parse().ok()?;
    if !n.is_finite() || js_number_string(n) != raw {
        return None;
    }
    Some(number_value(n))
}

/// Converts a float into a JSON number, preferring the integer form.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}
