//! `ProviderGateway`: uniform `generate_text` / `generate_image` dispatch
//! over the three providers, with per-provider-role rate limiting and
//! bounded retry on transient HTTP failures.
//!
//! Construction takes the config sections explicitly (API keys, per-role
//! selections) rather than reaching into a global — per §9's "global
//! mutable singletons... become an explicit service passed to
//! constructors."

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ApiKeysConfig, ProviderSelectionConfig};
use crate::error::LlmError;
use crate::model::{Provider, ProviderRole};

use super::anthropic::AnthropicProvider;
use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::ratelimit::{min_interval_for, RateLimiter};
use super::registry;
use super::{GenerationParams, LlmProvider, LlmResponse};

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Messages passed to `generate_text`: a system instruction and the user
/// prompt PromptAssembler produced. Kept as a flat pair rather than a full
/// chat history — no stage replays earlier turns back to the model.
#[derive(Debug, Clone)]
pub struct Messages {
    pub system: String,
    pub user: String,
}

pub struct ProviderGateway {
    api_keys: ApiKeysConfig,
    selections: ProviderSelectionConfig,
    limiter: Arc<RateLimiter>,
}

impl ProviderGateway {
    pub fn new(api_keys: ApiKeysConfig, selections: ProviderSelectionConfig) -> Self {
        Self { api_keys, selections, limiter: Arc::new(RateLimiter::new()) }
    }

    /// Build the concrete provider client for a registry entry, injecting
    /// the matching API key.
    fn build_provider(
        &self,
        model: &registry::AIModel,
    ) -> Result<Box<dyn LlmProvider>, LlmError> {
        let api_key = self
            .api_keys
            .for_provider(model.provider)
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::NotConfigured)?
            .to_string();

        Ok(match model.provider {
            Provider::Anthropic => Box::new(AnthropicProvider::new(api_key, model.wire_id.to_string())),
            Provider::Openai => {
                Box::new(OpenAiProvider::new(api_key, model.wire_id.to_string(), model.kind))
            }
            Provider::Gemini => Box::new(GeminiProvider::new(api_key, model.wire_id.to_string())),
        })
    }

    /// Resolve the registry entry for a role, defaulting max_tokens when
    /// the caller didn't pin one (Gemini free tier: default to the model's
    /// configured maximum).
    fn resolve(&self, role: ProviderRole) -> Result<registry::AIModel, LlmError> {
        let selection = self.selections.for_role(role).ok_or(LlmError::NotConfigured)?;
        registry::lookup(&selection.display_model_name).ok_or_else(|| {
            tracing::warn!(
                display_name = %selection.display_model_name,
                "unknown model display name, dispatching unchanged is not possible without a registry entry"
            );
            LlmError::NotConfigured
        })
    }

    /// Generate text for one pipeline stage's role. Applies the role's
    /// rate limiter before dispatch and retries transient HTTP failures.
    pub async fn generate_text(
        &self,
        role: ProviderRole,
        messages: Messages,
        params: GenerationParams,
    ) -> Result<LlmResponse, LlmError> {
        let model = self.resolve(role)?;
        let provider = self.build_provider(&model)?;

        let params = if model.provider == Provider::Gemini && params.max_tokens == 0 {
            GenerationParams { max_tokens: model.default_max_tokens, ..params }
        } else {
            params
        };

        let key = format!("{:?}:text", model.provider);
        self.limiter.acquire(&key, min_interval_for(model.provider)).await;

        with_retry(|| provider.complete(&messages.system, &messages.user, &params)).await
    }

    /// Not exercised by the core pipeline, but part of the surface (§4.1).
    pub async fn generate_image(
        &self,
        role: ProviderRole,
        prompt: &str,
        count: u32,
    ) -> Result<Vec<String>, LlmError> {
        let model = self.resolve(role)?;
        let provider = self.build_provider(&model)?;

        let key = format!("{:?}:image", model.provider);
        self.limiter.acquire(&key, min_interval_for(model.provider)).await;

        with_retry(|| provider.generate_image(prompt, count)).await
    }
}

/// Whether an error class is safe to retry (429 / 5xx / network). Semantic
/// errors (auth, parse, malformed response) are never retried.
fn is_retryable(err: &LlmError) -> bool {
    match err {
        LlmError::RateLimit { .. } | LlmError::Network(_) | LlmError::Timeout => true,
        LlmError::Response { status, .. } => *status >= 500,
        _ => false,
    }
}

async fn with_retry<T, F, Fut>(mut call: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, LlmError>>,
{
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS && is_retryable(&err) => {
                tracing::warn!(attempt, error = %err, "retrying transient provider error");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProviderRole;

    fn selections_with(role: ProviderRole, display_name: &str) -> ProviderSelectionConfig {
        ProviderSelectionConfig {
            roles: vec![crate::config::RoleSelection {
                role,
                provider: "anthropic".into(),
                display_model_name: display_name.into(),
            }],
        }
    }

    #[tokio::test]
    async fn missing_role_selection_is_not_configured() {
        let gateway = ProviderGateway::new(ApiKeysConfig::default(), ProviderSelectionConfig::default());
        let err = gateway
            .generate_text(
                ProviderRole::Writing,
                Messages { system: String::new(), user: "hi".into() },
                GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured));
    }

    #[tokio::test]
    async fn missing_api_key_is_not_configured() {
        let gateway = ProviderGateway::new(
            ApiKeysConfig::default(),
            selections_with(ProviderRole::Writing, "claude-sonnet-4"),
        );
        let err = gateway
            .generate_text(
                ProviderRole::Writing,
                Messages { system: String::new(), user: "hi".into() },
                GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured));
    }

    #[tokio::test]
    async fn unknown_display_name_is_not_configured() {
        let gateway = ProviderGateway::new(
            ApiKeysConfig { anthropic: Some("key".into()), ..Default::default() },
            selections_with(ProviderRole::Writing, "some-made-up-model"),
        );
        let err = gateway
            .generate_text(
                ProviderRole::Writing,
                Messages { system: String::new(), user: "hi".into() },
                GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured));
    }

    #[test]
    fn retryable_classes() {
        assert!(is_retryable(&LlmError::RateLimit { retry_after_secs: 1 }));
        assert!(is_retryable(&LlmError::Response { status: 503, body_snippet: String::new() }));
        assert!(is_retryable(&LlmError::Timeout));
        assert!(!is_retryable(&LlmError::Response { status: 400, body_snippet: String::new() }));
        assert!(!is_retryable(&LlmError::Auth));
        assert!(!is_retryable(&LlmError::Parse(String::new())));
    }
}
