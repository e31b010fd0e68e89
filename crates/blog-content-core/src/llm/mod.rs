//! Uniform "generate text / generate image" interface over multiple LLM
//! providers. Individual provider clients live in sibling modules;
//! `gateway` adds role-based dispatch and rate limiting on top.

pub mod anthropic;
pub mod gateway;
pub mod gemini;
pub mod openai;
pub mod ratelimit;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Token accounting for one completion call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn accumulate(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: TokenUsage,
    pub model: String,
}

/// Reasoning-effort hint for OpenAI reasoning-family models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub max_tokens: u32,
    /// Ignored by providers/models that forbid the field (OpenAI
    /// reasoning-family models).
    pub temperature: f32,
    pub system_prompt: Option<String>,
    pub reasoning_effort: Option<ReasoningEffort>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: 0.7,
            system_prompt: None,
            reasoning_effort: None,
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(
        &self,
        system: &str,
        user_message: &str,
        params: &GenerationParams,
    ) -> Result<LlmResponse, LlmError>;

    async fn health_check(&self) -> Result<(), LlmError>;

    /// Not exercised by the core pipeline, but part of the surface (§4.1).
    async fn generate_image(&self, _prompt: &str, _count: u32) -> Result<Vec<String>, LlmError> {
        Err(LlmError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_params_defaults() {
        let params = GenerationParams::default();
        assert_eq!(params.max_tokens, 2000);
        assert!((params.temperature - 0.7).abs() < f32::EPSILON);
        assert!(params.system_prompt.is_none());
        assert!(params.reasoning_effort.is_none());
    }

    #[test]
    fn token_usage_accumulates() {
        let mut usage = TokenUsage { input_tokens: 10, output_tokens: 20 };
        usage.accumulate(TokenUsage { input_tokens: 5, output_tokens: 7 });
        assert_eq!(usage.input_tokens, 15);
        assert_eq!(usage.output_tokens, 27);
    }
}
