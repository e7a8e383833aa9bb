//! # Canonical Hashing
//!
//! Deterministic content hashes for ledger payloads.
//!
//! Two producers that hold semantically identical data must arrive at the
//! same digest, so payloads are first rendered as canonical JSON:
//!
//! - object keys sorted by code point, at every depth
//! - no insignificant whitespace
//! - strings escaped exactly as `serde_json` escapes them
//! - finite floats with an integral value in the i64 or u64 range rendered as
//!   integers (`100.0` → `100`, `1e16` → `10000000000000000`)
//! - all other numbers in `serde_json`'s shortest round-trip form
//!
//! Digests are SHA-256, lowercase hex.

use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

use crate::domain::errors::ChainResult;

/// Lowercase hex SHA-256 digest.
pub type HashHex = String;

/// 2^63: integral floats in `[-2^63, 2^63)` convert to i64 exactly.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// 2^64: non-negative integral floats below it convert to u64 exactly.
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

/// SHA-256 of raw bytes as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> HashHex {
    hex::encode(Sha256::digest(bytes))
}

/// Render a JSON value in canonical form.
pub fn canonical_json(value: &Value) -> ChainResult<String> {
    let mut out = String::new();
    write_canonical(value, &mut out)?;
    Ok(out)
}

/// Canonical content hash of a structured payload.
pub fn hash_payload(value: &Value) -> ChainResult<HashHex> {
    let canonical = canonical_json(value)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

fn write_canonical(value: &Value, out: &mut String) -> ChainResult<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&canonical_number(n)),
        Value::String(s) => out.push_str(&serde_json::to_string(s)?),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            // Sort explicitly: serde_json may be built with `preserve_order`.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(&map[key], out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn canonical_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => {
            // -0.0 and 0.0 are the same amount.
            if f == 0.0 {
                "0".to_string()
            } else if (-I64_BOUND..I64_BOUND).contains(&f) {
                (f as i64).to_string()
            } else if (0.0..U64_BOUND).contains(&f) {
                (f as u64).to_string()
            } else {
                n.to_string()
            }
        }
        _ => n.to_string(),
    }
}
