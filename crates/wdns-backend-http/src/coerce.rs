//! Tolerant coercion of loosely-typed JSON fields
//!
//! The backend does not enforce JSON types strictly: TTLs arrive as numbers
//! or strings, record data as a string or a list. These helpers accept the
//! shapes seen in practice and return a parse error for anything else.

use serde_json::Value;
use wdns_core::{Error, Result};

/// String, number, bool or byte array → string
pub fn to_string(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(items) => {
            let bytes = items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| Error::parse(format!("expected string, got array {}", value)))?;
            String::from_utf8(bytes).map_err(|e| Error::parse(format!("invalid UTF-8 bytes: {}", e)))
        }
        other => Err(Error::parse(format!("expected string, got {}", other))),
    }
}

/// Integer, float (truncated) or string with leading digits → integer
pub fn to_int(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| Error::parse(format!("number out of range: {}", n))),
        Value::String(s) => leading_int(s)
            .ok_or_else(|| Error::parse(format!("expected integer, got \"{}\"", s))),
        other => Err(Error::parse(format!("expected integer, got {}", other))),
    }
}

/// Single string or list of stringish values → ordered list of strings
pub fn to_strings(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => items.iter().map(to_string).collect(),
        Value::String(s) => Ok(vec![s.clone()]),
        other => Err(Error::parse(format!("expected string or list, got {}", other))),
    }
}

/// Parse the optional sign and leading decimal digits of `s`
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let magnitude: i64 = rest[..end].parse().ok()?;

    Some(if negative { -magnitude } else { magnitude })
}
