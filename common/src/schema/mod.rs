//! Schema-driven codec between native typed values and the wire data model.
//!
//! A [`Schema`] declares the constructor tag and ordered field encoders for
//! one constructor-tagged record shape. Schemas are registered by name in a
//! [`SchemaRegistry`], which the codec consults to resolve record kinds on
//! encode and named/union references on decode. Field names exist only on the
//! native side; nothing but positions and tags survives on the wire.
//!
//! The registry is an explicit value passed through every encode/decode call.
//! Registration must complete before codec calls are issued; the registry is
//! additive and re-registering a name overwrites the prior entry.

pub mod validators;

use crate::data::ScriptData;
use indexmap::IndexMap;
use log::debug;
use num_bigint::BigInt;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("no schema registered for record kind '{0}'")]
    UnknownSchema(String),
    #[error("record '{schema}' is missing field '{field}'")]
    MissingField { schema: String, field: String },
    #[error("validator rejected value: {0}")]
    Validator(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("schema mismatch: '{schema}' expects constructor tag {expected}, got {found}")]
    SchemaMismatch {
        schema: String,
        expected: u64,
        found: String,
    },
    #[error("schema '{schema}' declares {expected} fields, node has {found}")]
    FieldCount {
        schema: String,
        expected: usize,
        found: usize,
    },
    #[error("field '{field}': expected {expected} node, got {found}")]
    UnexpectedNode {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("unknown schema '{0}'")]
    UnknownSchema(String),
    #[error("field '{0}': union value is not constructor data")]
    UnionShape(String),
    #[error("field '{field}': union tag {tag} out of range for {candidates} candidates")]
    UnionTagOutOfRange {
        field: String,
        tag: u64,
        candidates: usize,
    },
}

/// A value on the native side of the codec.
///
/// `Record` is the only open kind: its `kind` string selects a registered
/// schema. Everything else is matched exhaustively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Already-encoded wire data, passed through unchanged
    Data(ScriptData),
    Int(BigInt),
    /// Hex-encoded bytestring
    Bytes(String),
    List(Vec<Value>),
    /// Insertion-ordered pairs; order is preserved on the wire
    Map(Vec<(Value, Value)>),
    Record(RecordValue),
}

/// A constructor-tagged record: a schema kind plus named field values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordValue {
    pub kind: String,
    pub fields: IndexMap<String, Value>,
}

impl RecordValue {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl Value {
    pub fn int(value: impl Into<BigInt>) -> Self {
        Value::Int(value.into())
    }

    pub fn bytes(hex: impl Into<String>) -> Self {
        Value::Bytes(hex.into())
    }

    pub fn data(data: ScriptData) -> Self {
        Value::Data(data)
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn map(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(pairs.into_iter().collect())
    }

    pub fn record(kind: impl Into<String>, fields: Vec<(&str, Value)>) -> Self {
        Value::Record(RecordValue {
            kind: kind.into(),
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        })
    }

    /// Record with no fields, e.g. a bare union variant
    pub fn empty_record(kind: impl Into<String>) -> Self {
        Value::Record(RecordValue {
            kind: kind.into(),
            fields: IndexMap::new(),
        })
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Data(_) => "data",
            Value::Int(_) => "int",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
        }
    }
}

/// Narrows or rejects a native value before it is encoded.
pub type Validator = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Wire shape of one schema field.
#[derive(Clone)]
pub enum FieldKind {
    /// Raw passthrough, the field is already wire data
    Data,
    Int,
    Bytes,
    /// Ordered sequence with an element sub-encoder
    List(Box<FieldEncoder>),
    /// Key-ordered mapping with key/value sub-encoders
    Map(Box<FieldEncoder>, Box<FieldEncoder>),
    /// Reference to a single named schema
    Schema(String),
    /// Union over named schemas, dispatched positionally by constructor tag
    Union(Vec<String>),
}

/// Describes how one field is carried on the wire, plus an optional
/// validator applied to the source value before encoding.
#[derive(Clone)]
pub struct FieldEncoder {
    kind: FieldKind,
    validator: Option<Validator>,
}

impl FieldEncoder {
    pub fn data() -> Self {
        Self::of(FieldKind::Data)
    }

    pub fn int() -> Self {
        Self::of(FieldKind::Int)
    }

    pub fn bytes() -> Self {
        Self::of(FieldKind::Bytes)
    }

    pub fn list(element: FieldEncoder) -> Self {
        Self::of(FieldKind::List(Box::new(element)))
    }

    pub fn map(key: FieldEncoder, value: FieldEncoder) -> Self {
        Self::of(FieldKind::Map(Box::new(key), Box::new(value)))
    }

    pub fn schema(name: impl Into<String>) -> Self {
        Self::of(FieldKind::Schema(name.into()))
    }

    /// Union over the named schemas. The n-th candidate must carry
    /// constructor tag n in its own schema; this is not cross-checked.
    pub fn union<S: Into<String>>(candidates: impl IntoIterator<Item = S>) -> Self {
        Self::of(FieldKind::Union(
            candidates.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            validator: None,
        }
    }

    fn validate(&self, value: &Value) -> Result<Value, String> {
        match &self.validator {
            Some(validator) => validator(value.clone()),
            None => Ok(value.clone()),
        }
    }
}

impl fmt::Debug for FieldEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            FieldKind::Data => "data".to_string(),
            FieldKind::Int => "int".to_string(),
            FieldKind::Bytes => "bytes".to_string(),
            FieldKind::List(_) => "list".to_string(),
            FieldKind::Map(_, _) => "map".to_string(),
            FieldKind::Schema(name) => format!("schema({name})"),
            FieldKind::Union(names) => format!("union({})", names.join("|")),
        };
        f.debug_struct("FieldEncoder")
            .field("kind", &kind)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

/// Declared field order and per-field encoders for one constructor-tagged
/// shape.
#[derive(Clone, Debug)]
pub struct Schema {
    name: String,
    tag: u64,
    fields: Vec<(String, FieldEncoder)>,
}

impl Schema {
    pub fn new(name: impl Into<String>, tag: u64) -> Self {
        Self {
            name: name.into(),
            tag,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, encoder: FieldEncoder) -> Self {
        self.fields.push((name.into(), encoder));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> u64 {
        self.tag
    }

    pub fn fields(&self) -> &[(String, FieldEncoder)] {
        &self.fields
    }
}

/// Name-to-schema map consulted by the codec. Additive, never pruned.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    schemata: IndexMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under its name. Last write wins.
    pub fn register(&mut self, schema: Schema) {
        debug!(
            "registering schema '{}' (tag {}, {} fields)",
            schema.name,
            schema.tag,
            schema.fields.len()
        );
        self.schemata.insert(schema.name.clone(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemata.get(name)
    }

    pub fn len(&self) -> usize {
        self.schemata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemata.is_empty()
    }

    /// Encode a native value into wire data.
    ///
    /// Wire data passes through unchanged; integers, bytestrings, lists and
    /// maps map onto their node kinds; records resolve their schema by kind
    /// and encode each declared field in schema order, validator first.
    pub fn encode(&self, value: &Value) -> Result<ScriptData, EncodeError> {
        self.encode_inner(value, None)
    }

    fn encode_inner(
        &self,
        value: &Value,
        encoder: Option<&FieldEncoder>,
    ) -> Result<ScriptData, EncodeError> {
        match value {
            Value::Data(data) => Ok(data.clone()),
            Value::Int(n) => Ok(ScriptData::Int(n.clone())),
            Value::Bytes(hex) => Ok(ScriptData::Bytes(hex.clone())),
            Value::List(items) => {
                let element = match encoder.map(FieldEncoder::kind) {
                    Some(FieldKind::List(element)) => Some(element.as_ref()),
                    _ => None,
                };
                let mut nodes = Vec::with_capacity(items.len());
                for item in items {
                    match element {
                        Some(element) => {
                            let narrowed =
                                element.validate(item).map_err(EncodeError::Validator)?;
                            nodes.push(self.encode_inner(&narrowed, Some(element))?);
                        }
                        None => nodes.push(self.encode_inner(item, None)?),
                    }
                }
                Ok(ScriptData::List(nodes))
            }
            Value::Map(pairs) => {
                let entry = match encoder.map(FieldEncoder::kind) {
                    Some(FieldKind::Map(key, value)) => Some((key.as_ref(), value.as_ref())),
                    _ => None,
                };
                // Pairs are encoded in iteration order and never sorted
                let mut nodes = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    match entry {
                        Some((key_enc, value_enc)) => {
                            let key = key_enc.validate(k).map_err(EncodeError::Validator)?;
                            let value = value_enc.validate(v).map_err(EncodeError::Validator)?;
                            nodes.push((
                                self.encode_inner(&key, Some(key_enc))?,
                                self.encode_inner(&value, Some(value_enc))?,
                            ));
                        }
                        None => nodes.push((
                            self.encode_inner(k, None)?,
                            self.encode_inner(v, None)?,
                        )),
                    }
                }
                Ok(ScriptData::Map(nodes))
            }
            Value::Record(record) => {
                let schema = self
                    .get(&record.kind)
                    .ok_or_else(|| EncodeError::UnknownSchema(record.kind.clone()))?;
                let mut fields = Vec::with_capacity(schema.fields.len());
                for (name, field_encoder) in &schema.fields {
                    let value = record.get(name).ok_or_else(|| EncodeError::MissingField {
                        schema: schema.name.clone(),
                        field: name.clone(),
                    })?;
                    let narrowed = field_encoder
                        .validate(value)
                        .map_err(EncodeError::Validator)?;
                    fields.push(self.encode_inner(&narrowed, Some(field_encoder))?);
                }
                Ok(ScriptData::Constr {
                    tag: schema.tag,
                    fields,
                })
            }
        }
    }

    /// Decode wire data against a schema, reproducing the native record.
    ///
    /// The node must be constructor data carrying the schema's tag. Union
    /// fields use the nested constructor tag as a zero-based index into the
    /// declared candidate list.
    pub fn decode(&self, schema: &Schema, data: &ScriptData) -> Result<Value, DecodeError> {
        let (tag, nodes) = data.as_constr().ok_or_else(|| DecodeError::SchemaMismatch {
            schema: schema.name.clone(),
            expected: schema.tag,
            found: format!("{} node", data.kind_name()),
        })?;
        if tag != schema.tag {
            return Err(DecodeError::SchemaMismatch {
                schema: schema.name.clone(),
                expected: schema.tag,
                found: format!("tag {tag}"),
            });
        }
        if nodes.len() != schema.fields.len() {
            return Err(DecodeError::FieldCount {
                schema: schema.name.clone(),
                expected: schema.fields.len(),
                found: nodes.len(),
            });
        }

        let mut fields = IndexMap::with_capacity(schema.fields.len());
        for ((name, encoder), node) in schema.fields.iter().zip(nodes) {
            fields.insert(name.clone(), self.decode_field(name, encoder, node)?);
        }
        Ok(Value::Record(RecordValue {
            kind: schema.name.clone(),
            fields,
        }))
    }

    fn decode_field(
        &self,
        field: &str,
        encoder: &FieldEncoder,
        node: &ScriptData,
    ) -> Result<Value, DecodeError> {
        match &encoder.kind {
            FieldKind::Data => Ok(Value::Data(node.clone())),
            FieldKind::Bytes => node
                .as_bytes()
                .map(|hex| Value::Bytes(hex.to_string()))
                .ok_or_else(|| DecodeError::UnexpectedNode {
                    field: field.to_string(),
                    expected: "bytes",
                    found: node.kind_name(),
                }),
            FieldKind::Int => node
                .as_int()
                .map(|n| Value::Int(n.clone()))
                .ok_or_else(|| DecodeError::UnexpectedNode {
                    field: field.to_string(),
                    expected: "int",
                    found: node.kind_name(),
                }),
            FieldKind::List(element) => {
                let items = node.as_list().ok_or_else(|| DecodeError::UnexpectedNode {
                    field: field.to_string(),
                    expected: "list",
                    found: node.kind_name(),
                })?;
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.decode_field(field, element, item)?);
                }
                Ok(Value::List(values))
            }
            FieldKind::Map(key_enc, value_enc) => {
                let pairs = node.as_map().ok_or_else(|| DecodeError::UnexpectedNode {
                    field: field.to_string(),
                    expected: "map",
                    found: node.kind_name(),
                })?;
                let mut values = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    values.push((
                        self.decode_field(field, key_enc, k)?,
                        self.decode_field(field, value_enc, v)?,
                    ));
                }
                Ok(Value::Map(values))
            }
            FieldKind::Schema(name) => {
                let schema = self
                    .get(name)
                    .ok_or_else(|| DecodeError::UnknownSchema(name.clone()))?;
                self.decode(schema, node)
            }
            FieldKind::Union(candidates) => {
                let (tag, _) = node
                    .as_constr()
                    .ok_or_else(|| DecodeError::UnionShape(field.to_string()))?;
                let name = candidates.get(tag as usize).ok_or_else(|| {
                    DecodeError::UnionTagOutOfRange {
                        field: field.to_string(),
                        tag,
                        candidates: candidates.len(),
                    }
                })?;
                let schema = self
                    .get(name)
                    .ok_or_else(|| DecodeError::UnknownSchema(name.clone()))?;
                self.decode(schema, node)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(
            Schema::new("Pair", 0)
                .with_field("a", FieldEncoder::int())
                .with_field("b", FieldEncoder::int()),
        );
        registry
    }

    #[test]
    fn pair_encodes_to_tagged_constructor() {
        let registry = pair_registry();
        let value = Value::record("Pair", vec![("a", Value::int(3)), ("b", Value::int(-5))]);

        let data = registry.encode(&value).unwrap();
        assert_eq!(
            data,
            ScriptData::constr(0, [ScriptData::int(3), ScriptData::int(-5)])
        );

        let decoded = registry.decode(registry.get("Pair").unwrap(), &data).unwrap();
        let record = decoded.as_record().unwrap();
        assert_eq!(record.kind, "Pair");
        assert_eq!(record.get("a"), Some(&Value::int(3)));
        assert_eq!(record.get("b"), Some(&Value::int(-5)));
    }

    #[test]
    fn round_trips_nested_containers() {
        let mut registry = SchemaRegistry::new();
        registry.register(
            Schema::new("AssetClass", 0)
                .with_field("policy", FieldEncoder::bytes())
                .with_field("name", FieldEncoder::bytes()),
        );
        registry.register(
            Schema::new("Treasury", 0)
                .with_field("profit", FieldEncoder::int())
                .with_field(
                    "children",
                    FieldEncoder::list(FieldEncoder::schema("AssetClass")),
                )
                .with_field(
                    "balances",
                    FieldEncoder::map(FieldEncoder::bytes(), FieldEncoder::int()),
                )
                .with_field("extra", FieldEncoder::data()),
        );

        let asset = |policy: &str, name: &str| {
            Value::record(
                "AssetClass",
                vec![("policy", Value::bytes(policy)), ("name", Value::bytes(name))],
            )
        };
        let value = Value::record(
            "Treasury",
            vec![
                ("profit", Value::int(42)),
                ("children", Value::list([asset("aa", "01"), asset("bb", "")])),
                (
                    "balances",
                    Value::map([
                        (Value::bytes("ff"), Value::int(7)),
                        (Value::bytes("00"), Value::int(-1)),
                    ]),
                ),
                ("extra", Value::data(ScriptData::unit(3))),
            ],
        );

        let data = registry.encode(&value).unwrap();
        let decoded = registry
            .decode(registry.get("Treasury").unwrap(), &data)
            .unwrap();
        let record = decoded.as_record().unwrap();
        assert_eq!(record.kind, "Treasury");
        assert_eq!(record.get("profit"), Some(&Value::int(42)));
        assert_eq!(
            record.get("children"),
            Some(&Value::list([asset("aa", "01"), asset("bb", "")]))
        );
        assert_eq!(
            record.get("balances"),
            Some(&Value::map([
                (Value::bytes("ff"), Value::int(7)),
                (Value::bytes("00"), Value::int(-1)),
            ]))
        );
        assert_eq!(record.get("extra"), Some(&Value::data(ScriptData::unit(3))));
    }

    #[test]
    fn map_insertion_order_survives_round_trip() {
        let mut registry = SchemaRegistry::new();
        registry.register(Schema::new("Wrap", 0).with_field(
            "entries",
            FieldEncoder::map(FieldEncoder::bytes(), FieldEncoder::int()),
        ));

        // Deliberately non-sorted key order
        let pairs = [
            (Value::bytes("zz"), Value::int(1)),
            (Value::bytes("aa"), Value::int(2)),
            (Value::bytes("mm"), Value::int(3)),
        ];
        let value = Value::record("Wrap", vec![("entries", Value::map(pairs.clone()))]);

        let data = registry.encode(&value).unwrap();
        let ScriptData::Constr { fields, .. } = &data else {
            panic!("expected constructor data");
        };
        let encoded_keys: Vec<_> = fields[0]
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect();
        assert_eq!(
            encoded_keys,
            vec![
                ScriptData::bytes("zz"),
                ScriptData::bytes("aa"),
                ScriptData::bytes("mm")
            ]
        );

        let decoded = registry.decode(registry.get("Wrap").unwrap(), &data).unwrap();
        assert_eq!(
            decoded.as_record().unwrap().get("entries"),
            Some(&Value::map(pairs))
        );
    }

    fn boolean_registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(Schema::new("False", 0));
        registry.register(Schema::new("True", 1));
        registry.register(Schema::new("Flag", 0).with_field(
            "value",
            FieldEncoder::union(["False", "True"]),
        ));
        registry
    }

    #[test]
    fn union_dispatches_on_constructor_tag() {
        let registry = boolean_registry();
        let flag = registry.get("Flag").unwrap();

        for (tag, kind) in [(0, "False"), (1, "True")] {
            let data = ScriptData::constr(0, [ScriptData::unit(tag)]);
            let decoded = registry.decode(flag, &data).unwrap();
            assert_eq!(
                decoded.as_record().unwrap().get("value"),
                Some(&Value::empty_record(kind))
            );
        }
    }

    #[test]
    fn union_tag_out_of_range_is_an_error() {
        let registry = boolean_registry();
        let flag = registry.get("Flag").unwrap();
        let data = ScriptData::constr(0, [ScriptData::unit(2)]);
        let err = registry.decode(flag, &data).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnionTagOutOfRange {
                tag: 2,
                candidates: 2,
                ..
            }
        ));
    }

    #[test]
    fn union_field_must_be_constructor_data() {
        let registry = boolean_registry();
        let flag = registry.get("Flag").unwrap();
        let data = ScriptData::constr(0, [ScriptData::int(1)]);
        let err = registry.decode(flag, &data).unwrap_err();
        assert!(matches!(err, DecodeError::UnionShape(_)));
    }

    #[test]
    fn union_round_trips_through_encode() {
        let registry = boolean_registry();
        let value = Value::record("Flag", vec![("value", Value::empty_record("True"))]);
        let data = registry.encode(&value).unwrap();
        assert_eq!(data, ScriptData::constr(0, [ScriptData::unit(1)]));
        let decoded = registry.decode(registry.get("Flag").unwrap(), &data).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn validator_rejects_before_encode() {
        let mut registry = SchemaRegistry::new();
        registry.register(Schema::new("Deposit", 0).with_field(
            "amount",
            FieldEncoder::int().with_validator(validators::positive()),
        ));

        let good = Value::record("Deposit", vec![("amount", Value::int(5))]);
        assert!(registry.encode(&good).is_ok());

        let bad = Value::record("Deposit", vec![("amount", Value::int(0))]);
        let err = registry.encode(&bad).unwrap_err();
        assert!(matches!(err, EncodeError::Validator(_)));
    }

    #[test]
    fn list_elements_are_validated() {
        let mut registry = SchemaRegistry::new();
        registry.register(Schema::new("Amounts", 0).with_field(
            "values",
            FieldEncoder::list(FieldEncoder::int().with_validator(validators::natural())),
        ));

        let bad = Value::record(
            "Amounts",
            vec![("values", Value::list([Value::int(1), Value::int(-1)]))],
        );
        assert!(registry.encode(&bad).is_err());
    }

    #[test]
    fn unknown_record_kind_fails_encode() {
        let registry = SchemaRegistry::new();
        let value = Value::empty_record("Ghost");
        assert!(matches!(
            registry.encode(&value).unwrap_err(),
            EncodeError::UnknownSchema(name) if name == "Ghost"
        ));
    }

    #[test]
    fn missing_record_field_fails_encode() {
        let registry = pair_registry();
        let value = Value::record("Pair", vec![("a", Value::int(1))]);
        assert!(matches!(
            registry.encode(&value).unwrap_err(),
            EncodeError::MissingField { field, .. } if field == "b"
        ));
    }

    #[test]
    fn unknown_schema_reference_fails_decode() {
        let mut registry = SchemaRegistry::new();
        registry.register(Schema::new("Holder", 0).with_field(
            "inner",
            FieldEncoder::schema("Missing"),
        ));
        let data = ScriptData::constr(0, [ScriptData::unit(0)]);
        let err = registry
            .decode(registry.get("Holder").unwrap(), &data)
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownSchema(name) if name == "Missing"));
    }

    #[test]
    fn wrong_constructor_tag_fails_decode() {
        let registry = pair_registry();
        let data = ScriptData::constr(7, [ScriptData::int(1), ScriptData::int(2)]);
        let err = registry.decode(registry.get("Pair").unwrap(), &data).unwrap_err();
        assert!(matches!(err, DecodeError::SchemaMismatch { .. }));
    }

    #[test]
    fn non_constructor_node_fails_decode() {
        let registry = pair_registry();
        let err = registry
            .decode(registry.get("Pair").unwrap(), &ScriptData::int(1))
            .unwrap_err();
        assert!(matches!(err, DecodeError::SchemaMismatch { .. }));
    }

    #[test]
    fn scalar_field_requires_matching_node() {
        let registry = pair_registry();
        let data = ScriptData::constr(0, [ScriptData::bytes("00"), ScriptData::int(2)]);
        let err = registry.decode(registry.get("Pair").unwrap(), &data).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedNode {
                expected: "int",
                found: "bytes",
                ..
            }
        ));
    }

    #[test]
    fn reregistering_a_name_overwrites() {
        let mut registry = pair_registry();
        registry.register(Schema::new("Pair", 3));
        assert_eq!(registry.get("Pair").unwrap().tag(), 3);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn big_integers_survive_round_trip() {
        let registry = pair_registry();
        let huge: BigInt = BigInt::from(1_000_000_000u64) * BigInt::from(1_000_000_000u64)
            * BigInt::from(1_000_000_000u64);
        let value = Value::record(
            "Pair",
            vec![("a", Value::Int(huge.clone())), ("b", Value::Int(-huge.clone()))],
        );
        let data = registry.encode(&value).unwrap();
        let decoded = registry.decode(registry.get("Pair").unwrap(), &data).unwrap();
        assert_eq!(decoded, value);
    }
}
