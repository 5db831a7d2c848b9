use serde::Deserialize;

use record_api::Value;

fn default_true() -> bool {
    true
}

fn default_value() -> DefaultValue {
    DefaultValue::Literal("[]".to_string())
}

/// Configuration of one `JsonFieldBehavior` attachment.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonFieldConfig {
    /// Record fields stored as JSON text. Encode visits them in this order.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub encode_options: EncodeOptions,
    /// Written on encode when a field is empty. Ignored for null fields
    /// while `skip_empty` is set.
    #[serde(default = "default_value")]
    pub default_value: DefaultValue,
    /// Leave null fields untouched on encode.
    #[serde(default = "default_true")]
    pub skip_empty: bool,
    /// Decode JSON objects into `Value::Map` rather than `Value::Object`.
    #[serde(default = "default_true")]
    pub decode_as_map: bool,
}

impl JsonFieldConfig {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl Default for JsonFieldConfig {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            encode_options: EncodeOptions::default(),
            default_value: default_value(),
            skip_empty: true,
            decode_as_map: true,
        }
    }
}

/// Flags controlling how JSON text is rendered on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodeOptions {
    /// Write non-ASCII characters as `\uXXXX` escapes.
    pub escape_unicode: bool,
    /// Write `/` as `\/`.
    pub escape_slashes: bool,
    pub pretty_print: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            escape_unicode: false,
            escape_slashes: true,
            pretty_print: false,
        }
    }
}

/// Value stored for an empty field.
///
/// In config JSON a string is taken verbatim as JSON text; anything else is
/// a structured value encoded once when the behavior is built.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Literal(String),
    Structured(Value),
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match raw {
            serde_json::Value::String(text) => DefaultValue::Literal(text),
            other => DefaultValue::Structured(Value::from(other)),
        })
    }
}
