//! # Canonical JSON Serialization
//!
//! Deterministic byte representation of JSON values: object keys sorted,
//! compact separators, and floating-point numbers rejected outright.
//!
//! ## Security Invariant
//!
//! [`CanonicalBytes`] is the only sanctioned input to signing and digest
//! computation in this workspace. Producing signatures or digests from raw
//! `serde_json::to_vec()` output is forbidden — two serializations of the
//! same value may differ in key order, which splits the signed bytes from
//! the verified bytes.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors from canonicalizing a JSON value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    /// Floating-point numbers have no canonical byte representation and
    /// are rejected. Monetary or fractional values must be encoded as
    /// strings or scaled integers.
    #[error("floating-point numbers are not canonicalizable: {0}")]
    FloatRejected(String),

    /// The value could not be serialized to JSON at all.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Canonical, deterministic bytes of a JSON value.
///
/// Construction sorts object keys recursively, uses compact separators,
/// and fails on any float. Equal values always produce equal bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    pub fn new<T: Serialize>(value: &T) -> Result<Self, CanonicalizationError> {
        let val = serde_json::to_value(value)
            .map_err(|e| CanonicalizationError::Serialization(e.to_string()))?;
        Self::from_value(val)
    }

    /// Canonicalize an already-materialized `serde_json::Value`.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let mut out = Vec::new();
        write_canonical(&value, &mut out)?;
        Ok(Self(out))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Recursively write a value in canonical form: sorted keys, compact
/// separators, floats rejected.
fn write_canonical(value: &Value, out: &mut Vec<u8>) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => {
            if n.is_f64() && n.as_i64().is_none() && n.as_u64().is_none() {
                return Err(CanonicalizationError::FloatRejected(n.to_string()));
            }
            out.extend_from_slice(n.to_string().as_bytes());
        }
        Value::String(s) => {
            // serde_json string escaping is deterministic for a given input.
            let encoded = serde_json::to_string(s)
                .map_err(|e| CanonicalizationError::Serialization(e.to_string()))?;
            out.extend_from_slice(encoded.as_bytes());
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                let encoded = serde_json::to_string(key)
                    .map_err(|e| CanonicalizationError::Serialization(e.to_string()))?;
                out.extend_from_slice(encoded.as_bytes());
                out.push(b':');
                write_canonical(&map[key.as_str()], out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}
