use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LLMError {
    /// Fatal: the provider cannot be constructed at all. Reported distinctly
    /// from runtime invocation failures.
    #[error("model provider is not configured: {0}")]
    Configuration(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("invalid response payload: {0}")]
    InvalidResponse(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),

    #[error("model invocation timed out after {0} seconds")]
    Timeout(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
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
}

#[derive(Debug, Clone)]
pub struct LLMRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// External text-completion capability. Treated as opaque, possibly slow,
/// possibly unreliable.
///
/// `invoke` returns the transport's raw reply as a `serde_json::Value` on
/// purpose: its shape is not statically known (a bare string, or an object
/// carrying the text under some transport-specific key, possibly nested).
/// Interpretation belongs to [`crate::llm::resolve`], never to callers.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn invoke(&self, request: LLMRequest) -> Result<Value, LLMError>;

    fn model_name(&self) -> &str;
}

pub struct OpenAIProvider {
    client: Client<OpenAIConfig>,
    model: String,
    max_retries: u32,
}

impl OpenAIProvider {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";

    /// Reads `OPENAI_API_KEY`; its absence is a configuration failure, not a
    /// runtime one.
    pub fn from_env(model: Option<String>) -> Result<Self, LLMError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| LLMError::Configuration("OPENAI_API_KEY not set".to_string()))?;

        Ok(Self::with_api_key(
            api_key,
            model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
        ))
    }

    pub fn with_api_key(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self {
            client,
            model,
            max_retries: 3,
        }
    }

    fn classify_error(message: String) -> LLMError {
        let lowered = message.to_ascii_lowercase();
        if lowered.contains("rate") {
            LLMError::RateLimited
        } else if lowered.contains("connect") || lowered.contains("network") {
            LLMError::Network(message)
        } else {
            LLMError::Api(message)
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn invoke(&self, request: LLMRequest) -> Result<Value, LLMError> {
        let messages: Vec<ChatCompletionRequestMessage> = request
            .messages
            .iter()
            .map(|message| match message.role {
                Role::System => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: message.content.clone(),
                        ..Default::default()
                    })
                }
                Role::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content:
                            async_openai::types::ChatCompletionRequestUserMessageContent::Text(
                                message.content.clone(),
                            ),
                        ..Default::default()
                    })
                }
            })
            .collect();

        let api_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens as u16)
            .build()
            .map_err(|e| LLMError::Api(e.to_string()))?;

        debug!(
            model = %self.model,
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "sending chat completion request"
        );

        let mut attempt = 0;
        let response = loop {
            attempt += 1;

            match self.client.chat().create(api_request.clone()).await {
                Ok(response) => break response,
                Err(e) => {
                    let message = e.to_string();
                    warn!(attempt, max = self.max_retries, error = %message, "chat completion attempt failed");

                    if attempt >= self.max_retries {
                        return Err(Self::classify_error(message));
                    }

                    let wait = if message.to_ascii_lowercase().contains("rate") {
                        Duration::from_secs(2_u64.pow(attempt))
                    } else {
                        Duration::from_millis(100 * attempt as u64)
                    };
                    tokio::time::sleep(wait).await;
                }
            }
        };

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "chat completion finished"
            );
        }

        // A well-behaved completion carries its text in choices[0]; hand that
        // back as the simplest reply shape. Anything else goes to the resolver
        // whole, so recoverable text is never dropped here.
        match response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
        {
            Some(content) => Ok(Value::String(content)),
            None => serde_json::to_value(&response)
                .map_err(|e| LLMError::InvalidResponse(e.to_string())),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
