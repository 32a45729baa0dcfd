//! Wire DTOs shared by every word-game service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error payload the server sends with any non-200 response.
///
/// Field names are fixed by the wire contract. `params` may be absent or
/// `null`, both of which read as an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub exception_class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Value>>,
}

impl ErrorDetails {
    pub fn new(exception_class: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            exception_class: exception_class.into(),
            error_message: Some(error_message.into()),
            params: None,
        }
    }

    pub fn message(&self) -> &str {
        self.error_message.as_deref().unwrap_or_default()
    }

    pub fn params(&self) -> &[Value] {
        self.params.as_deref().unwrap_or_default()
    }
}
