//! Scripted model for tests without network access.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::gateway::{ChatModel, Completion, LlmError, LlmResult, Message, ResponseFormat};

/// A request observed by [`ScriptedModel`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub response_format: Option<ResponseFormat>,
}

impl RecordedRequest {
    /// Schema name, or `None` for a free-text request.
    pub fn format_name(&self) -> Option<&str> {
        self.response_format.as_ref().map(|f| f.name.as_str())
    }
}

type Script = VecDeque<LlmResult<String>>;

/// Replays canned outputs keyed by response format.
///
/// Free-text requests draw from the reply queue; structured requests draw
/// from the queue registered under their schema name. Keying by format keeps
/// concurrent calls deterministic regardless of which future polls first.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<Script>,
    structured: Mutex<Vec<(String, Script)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a free-text reply.
    pub fn push_reply(&self, text: impl Into<String>) -> &Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Ok(text.into()));
        }
        self
    }

    /// Queue a failure for the next free-text request.
    pub fn push_reply_error(&self, error: LlmError) -> &Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(error));
        }
        self
    }

    /// Queue output for requests using the named schema.
    pub fn push_structured(&self, schema: &str, text: impl Into<String>) -> &Self {
        self.push_structured_result(schema, Ok(text.into()))
    }

    /// Queue a failure for requests using the named schema.
    pub fn push_structured_error(&self, schema: &str, error: LlmError) -> &Self {
        self.push_structured_result(schema, Err(error))
    }

    fn push_structured_result(&self, schema: &str, result: LlmResult<String>) -> &Self {
        if let Ok(mut structured) = self.structured.lock() {
            match structured.iter_mut().find(|(name, _)| name == schema) {
                Some((_, queue)) => queue.push_back(result),
                None => structured.push((schema.to_string(), VecDeque::from([result]))),
            }
        }
        self
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Number of requests that used the named schema.
    pub fn calls_for(&self, schema: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.format_name() == Some(schema))
            .count()
    }

    fn next_output(&self, format: Option<&ResponseFormat>) -> LlmResult<String> {
        let poisoned = || LlmError::Http("scripted model lock poisoned".into());
        let next = match format {
            None => self.replies.lock().map_err(|_| poisoned())?.pop_front(),
            Some(format) => self
                .structured
                .lock()
                .map_err(|_| poisoned())?
                .iter_mut()
                .find(|(name, _)| *name == format.name)
                .and_then(|(_, queue)| queue.pop_front()),
        };
        next.unwrap_or(Err(LlmError::EmptyResponse))
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        messages: Vec<Message>,
        response_format: Option<ResponseFormat>,
    ) -> LlmResult<Completion> {
        let output = self.next_output(response_format.as_ref());
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                messages,
                response_format,
            });
        }
        output.map(|text| Completion { text })
    }
}
