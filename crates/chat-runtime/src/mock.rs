//! Mock Transport and Tools
//!
//! For testing and demo purposes. `MockTransport` replays scripted
//! responses and records every request; `MockToolExecutor` records tool
//! invocations and answers with a fixed payload or a failure.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chat_core::{
    error::{ChatError, Result},
    tool::{ParameterSchema, ToolExecutor, ToolSchema},
    transport::Transport,
};
use serde_json::{Value, json};

/// A request seen by [`MockTransport`]
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Value,
    pub headers: Vec<String>,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
enum Reply {
    Json(Value),
    Failure(String),
}

/// Transport that replays scripted replies in order
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON body
    #[must_use]
    pub fn with_response(self, body: Value) -> Self {
        lock(&self.replies).push_back(Reply::Json(body));
        self
    }

    /// Queue the same JSON body `times` times
    #[must_use]
    pub fn with_repeated(self, body: &Value, times: usize) -> Self {
        {
            let mut replies = lock(&self.replies);
            for _ in 0..times {
                replies.push_back(Reply::Json(body.clone()));
            }
        }
        self
    }

    /// Queue a network failure
    #[must_use]
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        lock(&self.replies).push_back(Reply::Failure(message.into()));
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(
        &self,
        url: &str,
        body: &Value,
        headers: &[String],
        timeout: Duration,
    ) -> Result<Value> {
        lock(&self.requests).push(RecordedRequest {
            url: url.to_string(),
            body: body.clone(),
            headers: headers.to_vec(),
            timeout,
        });

        match lock(&self.replies).pop_front() {
            Some(Reply::Json(value)) => Ok(value),
            Some(Reply::Failure(message)) => Err(ChatError::Transport(message)),
            None => Err(ChatError::Transport("no scripted response left".into())),
        }
    }
}

/// Tool executor that records calls and returns a canned outcome
#[derive(Debug)]
pub struct MockToolExecutor {
    output: std::result::Result<Value, String>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl Default for MockToolExecutor {
    fn default() -> Self {
        Self::returning(json!({ "ok": true }))
    }
}

impl MockToolExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call succeeds with `output`
    pub fn returning(output: Value) -> Self {
        Self {
            output: Ok(output),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            output: Err(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(name, arguments)` of every invocation, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl ToolExecutor for MockToolExecutor {
    fn schemas(&self) -> Vec<ToolSchema> {
        vec![ToolSchema {
            name: "lookup".into(),
            description: "Look up a record by query".into(),
            parameters: vec![ParameterSchema::new("query", "string", "Search text").required()],
        }]
    }

    async fn execute_tool(&self, name: &str, arguments: &Value) -> Result<Value> {
        lock(&self.calls).push((name.to_string(), arguments.clone()));
        self.output.clone().map_err(ChatError::ToolExecution)
    }
}
