//! OpenAI chat-completions provider.
//!
//! Non-reasoning models use the classic `max_tokens` + `temperature` shape.
//! Reasoning-family models (the GPT-5 family) use `max_completion_tokens`
//! instead of `max_tokens`, must never send `temperature`, and may carry an
//! optional `reasoning.effort` hint.

use std::time::Duration;

use super::registry::ModelKind;
use super::{GenerationParams, LlmProvider, LlmResponse, TokenUsage};
use crate::error::LlmError;
use serde::{Deserialize, Serialize};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    kind: ModelKind,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, kind: ModelKind) -> Self {
        Self {
            client: build_client(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key,
            model,
            kind,
        }
    }

    pub fn with_base_url(api_key: String, model: String, kind: ModelKind, base_url: String) -> Self {
        Self {
            client: build_client(),
            base_url,
            api_key,
            model,
            kind,
        }
    }
}

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("reqwest client configuration is valid")
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        system: &str,
        user_message: &str,
        params: &GenerationParams,
    ) -> Result<LlmResponse, LlmError> {
        let system_prompt = params.system_prompt.as_deref().unwrap_or(system);

        tracing::debug!(
            provider = "openai",
            model = %self.model,
            reasoning = matches!(self.kind, ModelKind::Reasoning),
            "LLM request",
        );

        let messages = vec![
            ChatMessage { role: "system", content: system_prompt },
            ChatMessage { role: "user", content: user_message },
        ];

        let body = match self.kind {
            ModelKind::Standard => serde_json::to_value(ChatCompletionRequest {
                model: &self.model,
                messages,
                max_tokens: Some(params.max_tokens),
                max_completion_tokens: None,
                temperature: Some(params.temperature),
                reasoning: None,
            }),
            ModelKind::Reasoning => serde_json::to_value(ChatCompletionRequest {
                model: &self.model,
                messages,
                max_tokens: None,
                max_completion_tokens: Some(params.max_tokens),
                temperature: None,
                reasoning: params.reasoning_effort.map(|effort| ReasoningOptions { effort }),
            }),
        }
        .map_err(|e| LlmError::Parse(format!("failed to encode OpenAI request: {e}")))?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { LlmError::Timeout } else { LlmError::Network(e) })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();

            if status == 401 || status == 403 {
                return Err(LlmError::Auth);
            }

            if status == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(LlmError::RateLimit { retry_after_secs: retry_after });
            }

            let raw_body = response.text().await.unwrap_or_default();
            return Err(LlmError::Response {
                status,
                body_snippet: raw_body.chars().take(500).collect(),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("failed to parse OpenAI response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("OpenAI response had no choices".into()))?;

        let usage = parsed.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(LlmResponse {
            text: choice.message.content,
            usage,
            model: parsed.model,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        self.complete(
            "You are a test assistant.",
            "Say OK",
            &GenerationParams { max_tokens: 10, ..Default::default() },
        )
        .await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ReasoningOptions {
    effort: super::ReasoningEffort,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<ReasoningOptions>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}
