//! Record behavior that stores structured field values as JSON text.
//!
//! Attach a [`JsonFieldBehavior`] to a record type's [`Lifecycle`]: it decodes
//! the configured fields after a record is loaded or persisted and encodes
//! them back to JSON text right before the record is persisted.
//!
//! [`Lifecycle`]: record_api::Lifecycle

pub mod config;
pub mod serializer;

use record_api::config::{resolve_params, ConfigParam, ParamType};
use record_api::value::ObjectShape;
use record_api::{Behavior, BehaviorError, Record, Value};

pub use config::{DefaultValue, EncodeOptions, JsonFieldConfig};

/// Stored text treated as the source of an empty or unset field.
const EMPTY_OBJECT: &str = "{}";

pub struct JsonFieldBehavior {
    fields: Vec<String>,
    encode_options: EncodeOptions,
    /// `default_value` resolved to JSON text.
    default_text: String,
    skip_empty: bool,
    shape: ObjectShape,
}

impl JsonFieldBehavior {
    /// Build from a typed config. Rejects an empty field list, duplicate or
    /// blank field names and a structured default that cannot be encoded.
    pub fn new(config: JsonFieldConfig) -> Result<Self, BehaviorError> {
        if config.fields.is_empty() {
            return Err(BehaviorError::config("at least one field is required"));
        }
        for (i, field) in config.fields.iter().enumerate() {
            if field.trim().is_empty() {
                return Err(BehaviorError::config("field name must not be blank"));
            }
            if config.fields[..i].contains(field) {
                return Err(BehaviorError::config(format!("field '{field}' listed twice")));
            }
        }
        let default_text = match config.default_value {
            DefaultValue::Literal(text) => text,
            DefaultValue::Structured(value) => {
                serializer::to_json_string(&value, &config.encode_options)
                    .map_err(|e| BehaviorError::config(format!("default_value: {e}")))?
            }
        };

        Ok(Self {
            fields: config.fields,
            encode_options: config.encode_options,
            default_text,
            skip_empty: config.skip_empty,
            shape: if config.decode_as_map {
                ObjectShape::Map
            } else {
                ObjectShape::Object
            },
        })
    }

    /// Build from a raw JSON config object, validated against
    /// [`config_params`](Self::config_params) and completed with their defaults.
    pub fn from_json_config(raw: &serde_json::Value) -> Result<Self, BehaviorError> {
        let resolved = resolve_params(&Self::config_params(), raw)
            .map_err(|e| e.with_context("json-field"))?;
        let config: JsonFieldConfig = serde_json::from_value(resolved)
            .map_err(|e| BehaviorError::config(format!("json-field: {e}")))?;
        Self::new(config)
    }

    /// Parameters accepted by [`from_json_config`](Self::from_json_config).
    pub fn config_params() -> Vec<ConfigParam> {
        vec![
            ConfigParam::new("fields", ParamType::StrList, "Record fields stored as JSON text")
                .required(),
            ConfigParam::new("encode_options", ParamType::Table, "JSON rendering flags")
                .with_default(serde_json::json!({
                    "escape_unicode": false,
                    "escape_slashes": true,
                    "pretty_print": false,
                })),
            ConfigParam::new(
                "default_value",
                ParamType::Any,
                "Stored for empty fields: a string is used verbatim, anything else is encoded",
            )
            .with_default(serde_json::json!("[]")),
            ConfigParam::new("skip_empty", ParamType::Bool, "Leave null fields untouched on encode")
                .with_default(serde_json::json!(true)),
            ConfigParam::new("decode_as_map", ParamType::Bool, "Decode objects as maps")
                .with_default(serde_json::json!(true)),
        ]
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn encode_options(&self) -> &EncodeOptions {
        &self.encode_options
    }

    pub fn default_text(&self) -> &str {
        &self.default_text
    }

    /// Check that every configured field exists on `record`.
    pub fn validate(&self, record: &dyn Record) -> Result<(), BehaviorError> {
        match self.fields.iter().find(|f| !record.has_field(f)) {
            Some(field) => Err(BehaviorError::UnknownField(field.clone())),
            None => Ok(()),
        }
    }

    /// Replace each field's JSON text with its parsed value.
    ///
    /// Unset and falsy fields decode as `{}`. Arrays, maps and objects are
    /// left as-is, so decoding them twice is harmless. A decoded JSON string
    /// is indistinguishable from stored text: a second `decode` parses it
    /// again, failing or replacing it with whatever the text holds.
    pub fn decode(&self, record: &mut dyn Record) -> Result<(), BehaviorError> {
        for field in &self.fields {
            let text = match record.get(field) {
                None => EMPTY_OBJECT,
                Some(value @ (Value::Array(_) | Value::Map(_) | Value::Object(_))) => {
                    tracing::trace!(field = %field, kind = value.kind(), "already decoded");
                    continue;
                }
                Some(value) if value.is_empty() => EMPTY_OBJECT,
                Some(Value::String(text)) => text.as_str(),
                // Non-falsy scalars parse to themselves.
                Some(value) => {
                    tracing::trace!(field = %field, kind = value.kind(), "already decoded");
                    continue;
                }
            };

            let json: serde_json::Value =
                serde_json::from_str(text).map_err(|source| BehaviorError::MalformedJson {
                    field: field.clone(),
                    raw: text.to_string(),
                    source,
                })?;
            let value = Value::from_json(json, self.shape);
            tracing::trace!(field = %field, kind = value.kind(), "decoded");
            record.set(field, value);
        }
        Ok(())
    }

    /// Replace each field's value with its JSON text.
    ///
    /// A string value is encoded like any other value, so a second `encode`
    /// without a `decode` in between wraps the text in another layer of
    /// quoting.
    pub fn encode(&self, record: &mut dyn Record) -> Result<(), BehaviorError> {
        for field in &self.fields {
            let text = match record.get(field) {
                None | Some(Value::Null) if self.skip_empty => {
                    tracing::trace!(field = %field, "null, skipped");
                    continue;
                }
                Some(value) if !value.is_empty() => {
                    serializer::to_json_string(value, &self.encode_options)
                        .map_err(|e| BehaviorError::encode(field.as_str(), e))?
                }
                _ => {
                    tracing::trace!(field = %field, "empty, using default");
                    self.default_text.clone()
                }
            };
            record.set(field, Value::String(text));
        }
        Ok(())
    }
}

impl Behavior for JsonFieldBehavior {
    fn name(&self) -> &str {
        "json-field"
    }

    fn after_load(&self, record: &mut dyn Record) -> Result<(), BehaviorError> {
        self.decode(record)
    }

    fn after_persist(&self, record: &mut dyn Record) -> Result<(), BehaviorError> {
        self.decode(record)
    }

    fn before_persist(&self, record: &mut dyn Record) -> Result<(), BehaviorError> {
        self.encode(record)
    }
}

#[cfg(test)]
mod tests {
    use record_api::{Map, MapRecord, Object};
    use serde_json::json;

    use super::*;

    fn behavior(config: JsonFieldConfig) -> JsonFieldBehavior {
        JsonFieldBehavior::new(config).unwrap()
    }

    fn map(pairs: &[(&str, Value)]) -> Value {
        Value::Map(pairs.iter().cloned().collect())
    }

    // ---- decode ----

    #[test]
    fn decode_preserves_integers_in_map() {
        let b = behavior(JsonFieldConfig::new(["data"]));
        let mut record = MapRecord::new().with("data", r#"{"a":1,"b":[1,2,3]}"#);
        b.decode(&mut record).unwrap();

        let expected = map(&[
            ("a", Value::Int(1)),
            ("b", Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])),
        ]);
        assert_eq!(record.get("data"), Some(&expected));
    }

    #[test]
    fn decode_empty_string_yields_empty_map() {
        let b = behavior(JsonFieldConfig::new(["meta"]));
        let mut record = MapRecord::new().with("meta", "");
        b.decode(&mut record).unwrap();
        assert_eq!(record.get("meta"), Some(&Value::Map(Map::new())));
    }

    #[test]
    fn decode_unset_and_falsy_fields_as_empty_object() {
        let b = behavior(JsonFieldConfig::new(["a", "b", "c", "d"]));
        let mut record = MapRecord::with_fields(["a"]).with("b", "0").with("c", false);
        b.decode(&mut record).unwrap();
        for f in ["a", "b", "c", "d"] {
            assert_eq!(record.get(f), Some(&Value::Map(Map::new())), "field {f}");
        }
    }

    #[test]
    fn decode_as_object_when_map_disabled() {
        let config = JsonFieldConfig {
            decode_as_map: false,
            ..JsonFieldConfig::new(["meta"])
        };
        let b = behavior(config);
        let mut record = MapRecord::new().with("meta", r#"{"status":"new","tags":["x"]}"#);
        b.decode(&mut record).unwrap();

        let obj = record.get("meta").and_then(Value::as_object).unwrap();
        assert_eq!(obj.prop("status"), Some(&Value::from("new")));
        assert_eq!(obj.prop("tags"), Some(&Value::Array(vec![Value::from("x")])));
    }

    #[test]
    fn decode_twice_is_a_no_op() {
        let mut record = MapRecord::new()
            .with("meta", r#"{"k":"v"}"#)
            .with("tags", "[]");
        let b = behavior(JsonFieldConfig::new(["meta", "tags"]));
        b.decode(&mut record).unwrap();
        assert_eq!(record.get("tags"), Some(&Value::Array(vec![])));
        let once = record.clone();
        b.decode(&mut record).unwrap();
        assert_eq!(record, once);
    }

    #[test]
    fn decode_scalar_json_text() {
        let b = behavior(JsonFieldConfig::new(["n", "s"]));
        let mut record = MapRecord::new().with("n", "42").with("s", r#""hi""#);
        b.decode(&mut record).unwrap();
        assert_eq!(record.get("n"), Some(&Value::Int(42)));
        assert_eq!(record.get("s"), Some(&Value::from("hi")));
    }

    #[test]
    fn decode_malformed_json_names_field() {
        let b = behavior(JsonFieldConfig::new(["ok", "bad", "later"]));
        let mut record = MapRecord::new()
            .with("ok", "[1]")
            .with("bad", "{not json")
            .with("later", "[2]");
        let err = b.decode(&mut record).unwrap_err();

        match &err {
            BehaviorError::MalformedJson { field, raw, .. } => {
                assert_eq!(field, "bad");
                assert_eq!(raw, "{not json");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(record.get("ok"), Some(&Value::Array(vec![Value::Int(1)])));
        assert_eq!(record.get("later"), Some(&Value::from("[2]")));
    }

    #[test]
    fn decode_leaves_other_fields_alone() {
        let b = behavior(JsonFieldConfig::new(["meta"]));
        let mut record = MapRecord::new().with("meta", "[]").with("name", "[]");
        b.decode(&mut record).unwrap();
        assert_eq!(record.get("name"), Some(&Value::from("[]")));
    }

    // ---- encode ----

    #[test]
    fn encode_skips_null_when_skip_empty() {
        let b = behavior(JsonFieldConfig::new(["meta"]));
        let mut record = MapRecord::with_fields(["meta"]);
        b.encode(&mut record).unwrap();
        assert_eq!(record.get("meta"), Some(&Value::Null));
    }

    #[test]
    fn encode_null_uses_default_without_skip_empty() {
        let config = JsonFieldConfig {
            skip_empty: false,
            ..JsonFieldConfig::new(["meta"])
        };
        let b = behavior(config);
        let mut record = MapRecord::with_fields(["meta"]);
        b.encode(&mut record).unwrap();
        assert_eq!(record.get("meta"), Some(&Value::from("[]")));
    }

    #[test]
    fn encode_empty_sequence_writes_literal_default() {
        let config = JsonFieldConfig {
            skip_empty: false,
            default_value: DefaultValue::Literal("[]".into()),
            ..JsonFieldConfig::new(["tags"])
        };
        let b = behavior(config);
        let mut record = MapRecord::new().with("tags", Value::Array(vec![]));
        b.encode(&mut record).unwrap();
        assert_eq!(record.get("tags"), Some(&Value::from("[]")));
    }

    #[test]
    fn encode_empty_value_writes_structured_default() {
        let config = JsonFieldConfig {
            skip_empty: false,
            default_value: DefaultValue::Structured(map(&[("status", Value::from("new"))])),
            ..JsonFieldConfig::new(["meta"])
        };
        let b = behavior(config);
        assert_eq!(b.default_text(), r#"{"status":"new"}"#);

        let mut record = MapRecord::new().with("meta", Value::Map(Map::new()));
        b.encode(&mut record).unwrap();
        assert_eq!(record.get("meta"), Some(&Value::from(r#"{"status":"new"}"#)));
    }

    #[test]
    fn encode_empty_non_null_uses_default_even_with_skip_empty() {
        let b = behavior(JsonFieldConfig::new(["meta"]));
        let mut record = MapRecord::new().with("meta", "");
        b.encode(&mut record).unwrap();
        assert_eq!(record.get("meta"), Some(&Value::from("[]")));
    }

    #[test]
    fn encode_empty_object_is_not_defaulted() {
        let b = behavior(JsonFieldConfig::new(["meta"]));
        let mut record = MapRecord::new().with("meta", Value::Object(Object::new()));
        b.encode(&mut record).unwrap();
        assert_eq!(record.get("meta"), Some(&Value::from("{}")));
    }

    #[test]
    fn encode_applies_options() {
        let config = JsonFieldConfig {
            encode_options: EncodeOptions {
                escape_unicode: true,
                escape_slashes: false,
                pretty_print: false,
            },
            ..JsonFieldConfig::new(["meta"])
        };
        let b = behavior(config);
        let mut record = MapRecord::new().with("meta", map(&[("url", Value::from("a/é"))]));
        b.encode(&mut record).unwrap();
        assert_eq!(record.get("meta"), Some(&Value::from(r#"{"url":"a/\u00e9"}"#)));
    }

    #[test]
    fn encode_non_finite_float_is_error() {
        let b = behavior(JsonFieldConfig::new(["m"]));
        let mut record = MapRecord::new().with("m", Value::Array(vec![Value::Float(f64::NAN)]));
        let err = b.encode(&mut record).unwrap_err();
        assert!(matches!(&err, BehaviorError::Encode { field, .. } if field == "m"), "{err}");
    }

    #[test]
    fn encode_follows_declared_order_and_stops_on_error() {
        let b = behavior(JsonFieldConfig::new(["first", "broken", "last"]));
        let mut record = MapRecord::new()
            .with("first", Value::Array(vec![Value::Int(1)]))
            .with("broken", Value::Float(f64::INFINITY))
            .with("last", Value::Array(vec![Value::Int(2)]));
        assert!(b.encode(&mut record).is_err());
        assert_eq!(record.get("first"), Some(&Value::from("[1]")));
        assert_eq!(record.get("last"), Some(&Value::Array(vec![Value::Int(2)])));
    }

    // ---- config ----

    #[test]
    fn empty_field_list_is_rejected() {
        let err = JsonFieldBehavior::new(JsonFieldConfig::default()).err().unwrap();
        assert!(err.to_string().contains("at least one field"), "{err}");

        let err = JsonFieldBehavior::from_json_config(&json!({"fields": []}))
            .err()
            .unwrap();
        assert!(matches!(err, BehaviorError::Config(_)), "{err}");
    }

    #[test]
    fn from_json_config_fills_defaults() {
        let b = JsonFieldBehavior::from_json_config(&json!({"fields": ["meta"]})).unwrap();
        assert_eq!(b.default_text(), "[]");
        assert_eq!(b.encode_options(), &EncodeOptions::default());
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let err = JsonFieldBehavior::new(JsonFieldConfig::new(["a", "a"]))
            .err()
            .unwrap();
        assert!(err.to_string().contains("listed twice"), "{err}");
    }

    #[test]
    fn non_finite_structured_default_is_rejected() {
        let config = JsonFieldConfig {
            default_value: DefaultValue::Structured(Value::Float(f64::NAN)),
            ..JsonFieldConfig::new(["a"])
        };
        assert!(matches!(
            JsonFieldBehavior::new(config),
            Err(BehaviorError::Config(_))
        ));
    }

    #[test]
    fn from_json_config_validates_params() {
        let b = JsonFieldBehavior::from_json_config(&json!({
            "fields": ["meta"],
            "default_value": {"status": "new"},
            "skip_empty": false,
        }))
        .unwrap();
        assert_eq!(b.fields(), ["meta"]);
        assert_eq!(b.default_text(), r#"{"status":"new"}"#);

        let err = JsonFieldBehavior::from_json_config(&json!({"fields": "meta"}))
            .err()
            .unwrap();
        assert!(err.to_string().starts_with("config error: json-field:"), "{err}");
    }

    #[test]
    fn validate_reports_unknown_field() {
        let b = behavior(JsonFieldConfig::new(["meta", "missing"]));
        let record = MapRecord::with_fields(["id", "meta"]);
        match b.validate(&record) {
            Err(BehaviorError::UnknownField(f)) => assert_eq!(f, "missing"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
