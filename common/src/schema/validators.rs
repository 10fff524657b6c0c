//! Generic validator combinators for [`FieldEncoder`](super::FieldEncoder).
//!
//! These narrow a source value before encoding; domain schemas compose them
//! per field. Rejections surface as `EncodeError::Validator`.

use super::Value;
use crate::config::{MAX_ASSET_NAME_SIZE, POLICY_ID_SIZE};
use num_bigint::BigInt;

type Check = fn(&BigInt) -> bool;

fn int_rule(
    description: &'static str,
    check: Check,
) -> impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static {
    move |value| match &value {
        Value::Int(n) if check(n) => Ok(value),
        Value::Int(n) => Err(format!("expected {description} integer, got {n}")),
        other => Err(format!("expected integer, got {}", other.kind_name())),
    }
}

/// Any integer except zero
pub fn non_zero() -> impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static {
    int_rule("non-zero", |n| *n != BigInt::from(0))
}

/// Zero or greater
pub fn natural() -> impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static {
    int_rule("natural", |n| *n >= BigInt::from(0))
}

/// Strictly greater than zero
pub fn positive() -> impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static {
    int_rule("positive", |n| *n > BigInt::from(0))
}

fn byte_len(hex_str: &str) -> Result<usize, String> {
    hex::decode(hex_str)
        .map(|bytes| bytes.len())
        .map_err(|e| format!("invalid hex bytestring: {e}"))
}

/// Bytestring of exactly `len` bytes
pub fn hex_bytes(len: usize) -> impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static {
    move |value| match &value {
        Value::Bytes(hex_str) => {
            let found = byte_len(hex_str)?;
            if found == len {
                Ok(value)
            } else {
                Err(format!("expected {len}-byte bytestring, got {found} bytes"))
            }
        }
        other => Err(format!("expected bytes, got {}", other.kind_name())),
    }
}

/// Bytestring of at most `max` bytes
pub fn hex_bytes_up_to(
    max: usize,
) -> impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static {
    move |value| match &value {
        Value::Bytes(hex_str) => {
            let found = byte_len(hex_str)?;
            if found <= max {
                Ok(value)
            } else {
                Err(format!(
                    "expected bytestring of at most {max} bytes, got {found}"
                ))
            }
        }
        other => Err(format!("expected bytes, got {}", other.kind_name())),
    }
}

/// Empty (the base asset) or a full policy id
pub fn policy_id() -> impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static {
    let full = hex_bytes(POLICY_ID_SIZE);
    move |value| match &value {
        Value::Bytes(hex_str) if hex_str.is_empty() => Ok(value),
        Value::Bytes(_) => full(value).map_err(|_| "invalid policy id".to_string()),
        other => Err(format!("expected bytes, got {}", other.kind_name())),
    }
}

/// Asset name: up to 32 bytes
pub fn asset_name() -> impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static {
    hex_bytes_up_to(MAX_ASSET_NAME_SIZE)
}
