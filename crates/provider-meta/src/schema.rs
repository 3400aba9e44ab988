//! # Resource Schemas & Calling Contexts
//!
//! The host runtime hands resource operations one of three state objects:
//!
//! - [`ResourceData`]: configuration (or state) being applied, checked against a [`Schema`].
//! - [`ResourceDiff`]: the planned change between two [`ResourceData`] snapshots.
//! - [`InstanceState`]: legacy flat attribute map, as produced by imports.
//!
//! All three can be handed to [`get_client`](crate::get_client) to obtain a
//! namespace-scoped client.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when values do not fit a schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("invalid address to set: {0:?}")]
    UnknownField(String),

    #[error("{field}: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        actual: String,
    },

    #[error("{0}: required field is not set")]
    MissingRequired(String),
}

/// Value type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
    Bool,
    Map,
}

impl FieldType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Map => value.is_object(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Bool => "bool",
            FieldType::Map => "map",
        };
        f.write_str(name)
    }
}

/// Normalizes a raw value before it is stored (e.g. trimming slashes).
pub type StateFunc = fn(&str) -> String;

/// Definition of a single field.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub kind: FieldType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    pub default: Option<Value>,
    pub description: &'static str,
    pub state_func: Option<StateFunc>,
}

impl FieldSchema {
    pub fn new(kind: FieldType) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            description: "",
            state_func: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn state_func(mut self, state_func: StateFunc) -> Self {
        self.state_func = Some(state_func);
        self
    }
}

/// Ordered set of field definitions for one resource.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<&'static str, FieldSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, field: FieldSchema) -> Self {
        self.fields.insert(name, field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldSchema)> {
        self.fields.iter().map(|(name, field)| (*name, field))
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Field values of one resource, validated against its [`Schema`].
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Arc<Schema>,
    id: String,
    values: BTreeMap<String, Value>,
}

impl ResourceData {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Arc::new(schema),
            id: String::new(),
            values: BTreeMap::new(),
        }
    }

    /// Builds resource data from raw configuration.
    ///
    /// Unknown fields and type mismatches are rejected; required fields are
    /// not checked here, see [`ResourceData::validate`].
    pub fn from_raw(schema: Schema, raw: Map<String, Value>) -> Result<Self, SchemaError> {
        let mut data = Self::new(schema);
        for (key, value) in raw {
            data.set(&key, value)?;
        }
        Ok(data)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Returns the stored value, falling back to the schema default.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values
            .get(key)
            .or_else(|| self.schema.get(key).and_then(|field| field.default.as_ref()))
    }

    /// Returns the value only if it is set to something other than its zero value.
    pub fn get_ok(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|value| !is_zero(value))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Sets `key`, applying the field's state function to string values.
    ///
    /// `Null` removes the value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), SchemaError> {
        let field = self
            .schema
            .get(key)
            .ok_or_else(|| SchemaError::UnknownField(key.to_string()))?;

        let value = value.into();
        if value.is_null() {
            self.values.remove(key);
            return Ok(());
        }
        if !field.kind.accepts(&value) {
            return Err(SchemaError::TypeMismatch {
                field: key.to_string(),
                expected: field.kind,
                actual: type_label(&value).to_string(),
            });
        }

        let value = match (field.state_func, value) {
            (Some(state_func), Value::String(s)) => Value::String(state_func(&s)),
            (_, value) => value,
        };
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Checks that every required field has a value.
    pub fn validate(&self) -> Result<(), SchemaError> {
        match self
            .schema
            .fields()
            .find(|(name, field)| field.required && self.get(name).is_none())
        {
            Some((name, _)) => Err(SchemaError::MissingRequired(name.to_string())),
            None => Ok(()),
        }
    }
}

/// A planned change: the prior values and the values being applied.
#[derive(Debug, Clone)]
pub struct ResourceDiff {
    old: ResourceData,
    new: ResourceData,
}

impl ResourceDiff {
    pub fn new(old: ResourceData, new: ResourceData) -> Self {
        Self { old, new }
    }

    pub fn id(&self) -> &str {
        self.old.id()
    }

    /// Returns the planned value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.new.get(key)
    }

    pub fn get_ok(&self, key: &str) -> Option<&Value> {
        self.new.get_ok(key)
    }

    /// Returns `(old, new)` for `key`.
    pub fn get_change(&self, key: &str) -> (Option<&Value>, Option<&Value>) {
        (self.old.get(key), self.new.get(key))
    }

    pub fn has_change(&self, key: &str) -> bool {
        let (old, new) = self.get_change(key);
        old != new
    }
}

/// Legacy flat state of a resource instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceState {
    pub id: String,
    pub attributes: HashMap<String, String>,
}

impl InstanceState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}
