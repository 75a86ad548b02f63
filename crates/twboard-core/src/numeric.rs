//! Locale-lenient numeric coercion for upstream row fields.
//!
//! Upstream rows carry numbers as locale-formatted strings (thousands
//! separators, `--` placeholders, occasional bare JSON numbers). Parse
//! failures coerce to zero instead of failing the row; this is a documented
//! lossy policy, logged so data-quality problems stay visible.

use serde_json::Value;
use tracing::warn;

/// Placeholder the exchange uses for prices with no trade.
const EMPTY_MARKERS: [&str; 3] = ["", "--", "-"];

fn cleaned(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if EMPTY_MARKERS.contains(&trimmed) {
        return None;
    }
    Some(trimmed.replace(',', ""))
}

/// Coerce a raw string into an unsigned integer; empty and unparseable
/// values become 0.
pub fn lenient_u64(raw: &str) -> u64 {
    let Some(stripped) = cleaned(raw) else {
        return 0;
    };
    match stripped.parse::<u64>() {
        Ok(value) => value,
        Err(_) => {
            // Tolerate integral fields arriving with a decimal tail.
            match stripped.parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => value as u64,
                _ => {
                    warn!(raw, "coercing unparseable integer field to 0");
                    0
                }
            }
        }
    }
}

/// Coerce a raw string into a decimal; empty and unparseable values
/// become 0.0.
pub fn lenient_f64(raw: &str) -> f64 {
    let Some(stripped) = cleaned(raw) else {
        return 0.0;
    };
    match stripped.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            warn!(raw, "coercing unparseable decimal field to 0");
            0.0
        }
    }
}

/// Integer coercion for a raw JSON cell, which may be a string or a number.
pub fn cell_u64(cell: &Value) -> u64 {
    match cell {
        Value::String(raw) => lenient_u64(raw),
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().map(|value| value.max(0.0) as u64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Decimal coercion for a raw JSON cell.
pub fn cell_f64(cell: &Value) -> f64 {
    match cell {
        Value::String(raw) => lenient_f64(raw),
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// String view of a raw JSON cell; non-strings become empty.
pub fn cell_str(cell: &Value) -> &str {
    cell.as_str().unwrap_or("")
}
