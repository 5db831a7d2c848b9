use crate::error::BehaviorError;

/// Parameter type for behavior configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    /// Array of strings.
    StrList,
    /// Object of nested parameters.
    Table,
    /// Any JSON value.
    Any,
}

impl ParamType {
    fn accepts(self, value: &serde_json::Value) -> bool {
        match self {
            ParamType::Bool => value.is_boolean(),
            ParamType::StrList => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| v.is_string())),
            ParamType::Table => value.is_object(),
            ParamType::Any => true,
        }
    }
}

/// Declaration of a single config parameter.
///
/// Behaviors export these so the host can validate a raw config object
/// BEFORE constructing the behavior.
#[derive(Debug, Clone)]
pub struct ConfigParam {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub default: Option<serde_json::Value>,
    pub description: String,
}

impl ConfigParam {
    pub fn new(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            default: None,
            description: description.into(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Check a raw JSON config object against parameter declarations and
/// return it with declared defaults filled in for absent keys.
///
/// Rejects unknown keys, missing required keys and values of the wrong type.
pub fn resolve_params(
    params: &[ConfigParam],
    config: &serde_json::Value,
) -> Result<serde_json::Value, BehaviorError> {
    let mut resolved = match config {
        serde_json::Value::Object(obj) => obj.clone(),
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            return Err(BehaviorError::config(format!(
                "expected a config object, got {other}"
            )));
        }
    };

    for key in resolved.keys() {
        if !params.iter().any(|p| &p.name == key) {
            return Err(BehaviorError::config(format!("unknown parameter '{key}'")));
        }
    }

    for param in params {
        match resolved.get(&param.name) {
            Some(value) if !param.param_type.accepts(value) => {
                return Err(BehaviorError::config(format!(
                    "parameter '{}' ({}) expects {:?}, got {value}",
                    param.name, param.description, param.param_type
                )));
            }
            Some(_) => {}
            None if param.required => {
                return Err(BehaviorError::config(format!(
                    "missing required parameter '{}' ({})",
                    param.name, param.description
                )));
            }
            None => {
                if let Some(default) = &param.default {
                    tracing::debug!(param = %param.name, %default, "using default");
                    resolved.insert(param.name.clone(), default.clone());
                }
            }
        }
    }

    Ok(serde_json::Value::Object(resolved))
}
