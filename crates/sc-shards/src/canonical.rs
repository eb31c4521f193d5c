//! Canonical encoding of resources for set comparison.
//!
//! Resources are arbitrary nested JSON. Two resources are the same finding
//! when their canonical encodings match: object keys sorted at every level,
//! compact separators, arrays in their original order, and integral floats
//! written as integers so `1` and `1.0` are the same value.

use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Canonical JSON text for a resource.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Number(number) => write_number(number, out),
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

fn write_number(number: &serde_json::Number, out: &mut String) {
    match number.as_f64() {
        Some(f) if number.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT_INT => {
            // -0.0 renders as 0.
            out.push_str(&(f as i64).to_string());
        }
        _ => out.push_str(&number.to_string()),
    }
}

/// SHA-256 of a resource's canonical JSON.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceFingerprint([u8; 32]);

impl ResourceFingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ResourceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ResourceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceFingerprint({})", &self.to_hex()[..12])
    }
}

/// Fingerprint a resource for hashing and set difference.
pub fn fingerprint(value: &Value) -> ResourceFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(value).as_bytes());
    ResourceFingerprint(hasher.finalize().into())
}
