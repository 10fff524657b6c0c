//! Canonical recursive data model used as the on-chain calling convention.
//!
//! Every redeemer and datum crossing the wire is one of exactly five node
//! kinds. Map entries keep their insertion order and are never sorted:
//! consumers hash the serialized form, so the caller-chosen order is part of
//! the observable value.

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// A node of the wire data model. Tree-shaped, no cycles.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptData {
    /// Hex-encoded bytestring, possibly empty
    Bytes(String),
    /// Arbitrary-precision signed integer
    Int(BigInt),
    /// Ordered sequence
    List(Vec<ScriptData>),
    /// Ordered key/value pairs, insertion order preserved
    Map(Vec<(ScriptData, ScriptData)>),
    /// Constructor-tagged data: small non-negative discriminant plus ordered fields
    Constr { tag: u64, fields: Vec<ScriptData> },
}

impl ScriptData {
    pub fn bytes(hex: impl Into<String>) -> Self {
        ScriptData::Bytes(hex.into())
    }

    pub fn int(value: impl Into<BigInt>) -> Self {
        ScriptData::Int(value.into())
    }

    pub fn list(items: impl IntoIterator<Item = ScriptData>) -> Self {
        ScriptData::List(items.into_iter().collect())
    }

    pub fn map(pairs: impl IntoIterator<Item = (ScriptData, ScriptData)>) -> Self {
        ScriptData::Map(pairs.into_iter().collect())
    }

    pub fn constr(tag: u64, fields: impl IntoIterator<Item = ScriptData>) -> Self {
        ScriptData::Constr {
            tag,
            fields: fields.into_iter().collect(),
        }
    }

    /// Unit constructor: `Constr(tag, [])`
    pub fn unit(tag: u64) -> Self {
        ScriptData::Constr {
            tag,
            fields: Vec::new(),
        }
    }

    pub fn as_bytes(&self) -> Option<&str> {
        match self {
            ScriptData::Bytes(hex) => Some(hex),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            ScriptData::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ScriptData]> {
        match self {
            ScriptData::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(ScriptData, ScriptData)]> {
        match self {
            ScriptData::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_constr(&self) -> Option<(u64, &[ScriptData])> {
        match self {
            ScriptData::Constr { tag, fields } => Some((*tag, fields)),
            _ => None,
        }
    }

    /// Short name of the node kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            ScriptData::Bytes(_) => "bytes",
            ScriptData::Int(_) => "int",
            ScriptData::List(_) => "list",
            ScriptData::Map(_) => "map",
            ScriptData::Constr { .. } => "constructor",
        }
    }
}
