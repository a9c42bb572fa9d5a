//! Language model gateway contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gateway errors. Every variant fails the calling stage; nothing is retried.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider returned no content")]
    EmptyResponse,

    #[error("Could not decode provider response: {0}")]
    Decode(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

/// Chat message author as understood by the provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Constrains the completion to a named JSON schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    pub name: String,
    pub schema: serde_json::Value,
}

impl ResponseFormat {
    pub fn json_schema(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// OpenAI `response_format` body with strict schema adherence.
    pub fn to_request_value(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.name,
                "strict": true,
                "schema": self.schema,
            }
        })
    }
}

/// Text produced by one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
}

/// A chat-completion model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model name for logging.
    fn name(&self) -> &str;

    /// Run one completion. Provider errors must surface as `Err`, never as
    /// malformed text.
    async fn complete(
        &self,
        messages: Vec<Message>,
        response_format: Option<ResponseFormat>,
    ) -> LlmResult<Completion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_format() {
        let json = serde_json::to_string(&Message::system("be kind")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"be kind"}"#);
    }

    #[test]
    fn test_response_format_request_value() {
        let format = ResponseFormat::json_schema("demo", serde_json::json!({"type": "object"}));
        let value = format.to_request_value();
        assert_eq!(value["type"], "json_schema");
        assert_eq!(value["json_schema"]["name"], "demo");
        assert_eq!(value["json_schema"]["strict"], true);
        assert_eq!(value["json_schema"]["schema"]["type"], "object");
    }
}
