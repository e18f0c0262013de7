//! Deterministic cache keys from tool parameters.
//!
//! Parameters are rendered to a canonical JSON form before hashing: object
//! keys are sorted recursively at every nesting level, arrays keep their
//! order, scalars use `serde_json`'s standard rendering. The sort is done
//! here explicitly rather than relying on `serde_json::Map` ordering, which
//! flips to insertion order when any crate in the build enables the
//! `preserve_order` feature.

use serde_json::Value;

/// Hash `parameters` into a stable cache key. Two values that are equal as
/// JSON produce the same key regardless of object key order.
pub fn generate_key(parameters: &Value) -> u64 {
    fnv1a(&canonical_json(parameters))
}

/// Render `value` in canonical form: sorted object keys, arrays in order.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, val)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
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
        other => out.push_str(&other.to_string()),
    }
}

/// FNV-1a 64-bit over the canonical string.
fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
