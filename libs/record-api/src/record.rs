use crate::value::{Map, Value};

/// Mutable, host-owned record exposing named fields.
///
/// Behaviors never own a record. They read and write fields in place while a
/// lifecycle hook runs.
pub trait Record {
    /// Current value of `field`. `None` if the record has no such field.
    fn get(&self, field: &str) -> Option<&Value>;

    fn set(&mut self, field: &str, value: Value);

    /// Whether `field` is part of the record's declared field set.
    fn has_field(&self, field: &str) -> bool;
}

/// Record backed by an insertion-ordered map.
///
/// Declared fields start as `Value::Null`, the way an unsaved row starts with
/// every column unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapRecord {
    fields: Map,
}

impl MapRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: names.into_iter().map(|n| (n, Value::Null)).collect(),
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn fields(&self) -> &Map {
        &self.fields
    }

    pub fn into_fields(self) -> Map {
        self.fields
    }
}

impl From<Map> for MapRecord {
    fn from(fields: Map) -> Self {
        Self { fields }
    }
}

impl Record for MapRecord {
    fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field, value);
    }

    fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}
