//! Canned provider for tests. Replies are arbitrary [`serde_json::Value`]
//! shapes on purpose: the resolver's duck-typed probing is part of what the
//! tests exercise.

use crate::llm::provider::{LLMError, LLMProvider, LLMRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MockLLMProvider {
    /// (needle, reply) pairs probed in insertion order against the combined
    /// lowercased prompt; first hit wins.
    replies: Vec<(String, Value)>,
    default_reply: Value,
    call_count: AtomicUsize,
    should_fail: bool,
}

impl Default for MockLLMProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLLMProvider {
    pub fn new() -> Self {
        Self {
            replies: Vec::new(),
            default_reply: Value::String("[]".to_string()),
            call_count: AtomicUsize::new(0),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        let mut provider = Self::new();
        provider.should_fail = true;
        provider
    }

    pub fn with_reply(mut self, needle: &str, reply: Value) -> Self {
        self.replies.push((needle.to_ascii_lowercase(), reply));
        self
    }

    pub fn with_default_reply(mut self, reply: Value) -> Self {
        self.default_reply = reply;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn reset_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    fn generate_reply(&self, request: &LLMRequest) -> Value {
        let combined: String = request
            .messages
            .iter()
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();

        for (needle, reply) in &self.replies {
            if combined.contains(needle) {
                return reply.clone();
            }
        }

        self.default_reply.clone()
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    async fn invoke(&self, request: LLMRequest) -> Result<Value, LLMError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.should_fail {
            return Err(LLMError::Api("mock provider configured to fail".to_string()));
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;

        Ok(self.generate_reply(&request))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
