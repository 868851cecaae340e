//! Export metadata records and shape matching.
//!
//! # Responsibility
//! - Hold the optional structured record attached to one export.
//! - Decide whether a record satisfies the shape a caller asks for.
//!
//! # Invariants
//! - A record is always a JSON object; scalar or array metadata is rejected
//!   at declaration time.
//! - Shape matching never fails the lookup: a mismatch yields `None`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Structured metadata attached to one export.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportMetadata {
    fields: Map<String, Value>,
}

impl ExportMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from any serializable value that serializes to an
    /// object (structs, maps).
    pub fn from_serializable<S: Serialize + ?Sized>(value: &S) -> Result<Self, MetadataError> {
        let value = serde_json::to_value(value)
            .map_err(|err| MetadataError::Serialization(err.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, MetadataError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(MetadataError::NotAnObject(value_kind(&other))),
        }
    }

    /// Adds one field, replacing an existing value with the same key.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decodes this record into the caller's metadata view `M`.
    ///
    /// Fields `M` does not declare are ignored; a required field of `M` that
    /// is missing or has an incompatible type makes the record not match.
    pub fn view<M: DeserializeOwned>(&self) -> Option<M> {
        serde_json::from_value(Value::Object(self.fields.clone())).ok()
    }

    pub fn satisfies<M: DeserializeOwned>(&self) -> bool {
        self.view::<M>().is_some()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Metadata declaration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    Serialization(String),
    NotAnObject(&'static str),
}

impl Display for MetadataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialization(reason) => write!(f, "metadata failed to serialize: {reason}"),
            Self::NotAnObject(kind) => {
                write!(f, "metadata must be an object record, got {kind}")
            }
        }
    }
}

impl Error for MetadataError {}
