/// Error returned by behavior hooks.
///
/// Every data error names the record field it came from, so the host can
/// report which column aborted the load/persist operation.
#[derive(Debug, thiserror::Error)]
pub enum BehaviorError {
    #[error("field '{field}' holds malformed JSON {raw:?}: {source}")]
    MalformedJson {
        field: String,
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("field '{field}' cannot be encoded as JSON: {reason}")]
    Encode { field: String, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown field: {0}")]
    UnknownField(String),
}

impl BehaviorError {
    pub fn config(msg: impl Into<String>) -> Self {
        BehaviorError::Config(msg.into())
    }

    pub fn encode(field: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        BehaviorError::Encode {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// Field the error is attributed to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            BehaviorError::MalformedJson { field, .. } | BehaviorError::Encode { field, .. } => {
                Some(field.as_str())
            }
            BehaviorError::UnknownField(field) => Some(field.as_str()),
            BehaviorError::Config(_) => None,
        }
    }

    /// Add context to the error.
    ///
    /// For `Config` and `Encode`, context is prepended to the message.
    /// Other variants keep their structured payload unchanged.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            BehaviorError::Config(msg) => BehaviorError::Config(format!("{ctx}: {msg}")),
            BehaviorError::Encode { field, reason } => BehaviorError::Encode {
                field,
                reason: format!("{ctx}: {reason}"),
            },
            other => other,
        }
    }
}
