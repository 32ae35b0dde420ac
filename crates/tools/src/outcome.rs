//! The classified result every lookup tool returns to the model.

use serde::{Deserialize, Serialize};
use shopdesk_core::error::ToolError;

/// Serialized with a `status` discriminator, e.g.
/// `{"status":"no_match","message":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupOutcome {
    Success {
        data: serde_json::Value,
    },
    NoMatch {
        message: String,
    },
    MultipleMatches {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matches: Option<Vec<String>>,
    },
    Error {
        message: String,
    },
}

impl LookupOutcome {
    pub fn success(data: impl Serialize) -> Result<Self, ToolError> {
        Ok(Self::Success {
            data: serde_json::to_value(data)?,
        })
    }

    pub fn no_match(message: impl Into<String>) -> Self {
        Self::NoMatch {
            message: message.into(),
        }
    }

    pub fn multiple_matches(message: impl Into<String>) -> Self {
        Self::MultipleMatches {
            message: message.into(),
            matches: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::NoMatch { .. } => "no_match",
            Self::MultipleMatches { .. } => "multiple_matches",
            Self::Error { .. } => "error",
        }
    }

    /// The JSON text handed back to the model as the tool result.
    pub fn to_json(&self) -> Result<String, ToolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A string argument, or `""` when it is missing or not a string.
pub(crate) fn string_arg<'a>(input: &'a serde_json::Value, key: &str) -> &'a str {
    input.get(key).and_then(|v| v.as_str()).unwrap_or_default()
}
