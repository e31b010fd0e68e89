//! Google Gemini provider (`generateContent` REST endpoint).
//!
//! The API key travels in the URL query string rather than a header, and
//! there is no native system/user role split: both prompts are flattened
//! into a single text part, prefixed so the model can still tell them apart.

use std::time::Duration;

use super::{GenerationParams, LlmProvider, LlmResponse, TokenUsage};
use crate::error::LlmError;
use serde::{Deserialize, Serialize};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: build_client(),
            base_url: GEMINI_BASE_URL.to_string(),
            api_key,
            model,
        }
    }

    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: build_client(),
            base_url,
            api_key,
            model,
        }
    }

    fn flatten_prompt(system: &str, user_message: &str) -> String {
        if system.is_empty() {
            format!("User: {user_message}")
        } else {
            format!("System: {system}\n\nUser: {user_message}")
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
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        system: &str,
        user_message: &str,
        params: &GenerationParams,
    ) -> Result<LlmResponse, LlmError> {
        let system_prompt = params.system_prompt.as_deref().unwrap_or(system);
        let text = Self::flatten_prompt(system_prompt, user_message);

        tracing::debug!(provider = "gemini", model = %self.model, "LLM request");

        let request = GenerateContentRequest {
            contents: vec![Content { parts: vec![Part { text: &text }] }],
            generation_config: GenerationConfig {
                max_output_tokens: params.max_tokens,
                temperature: params.temperature,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&request)
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

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("failed to parse Gemini response: {e}")))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("Gemini response had no candidates".into()))?;

        let text = candidate
            .content
            .parts
            .into_iter()
            .next()
            .map(|p| p.text)
            .unwrap_or_default();

        let usage = parsed
            .usage_metadata
            .map_or_else(TokenUsage::default, |u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            });

        Ok(LlmResponse { text, usage, model: self.model.clone() })
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
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn complete_success() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "안녕하세요"}]}
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4}
        });

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_base_url(
            "test-key".into(),
            "gemini-2.5-flash".into(),
            server.uri(),
        );

        let resp = provider
            .complete("system", "hello", &GenerationParams::default())
            .await
            .expect("complete");

        assert_eq!(resp.text, "안녕하세요");
        assert_eq!(resp.usage.input_tokens, 12);
        assert_eq!(resp.usage.output_tokens, 4);
    }

    #[tokio::test]
    async fn api_key_travels_in_query_string() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_base_url(
            "my-secret-key".into(),
            "gemini-2.5-flash".into(),
            server.uri(),
        );

        provider
            .complete("", "hello", &GenerationParams::default())
            .await
            .expect("complete");

        let received = server.received_requests().await.expect("requests");
        let full_url = received[0].url.to_string();
        assert!(full_url.contains("key=my-secret-key"));
    }

    #[tokio::test]
    async fn flattens_system_and_user_into_single_part() {
        assert_eq!(
            GeminiProvider::flatten_prompt("be concise", "hi"),
            "System: be concise\n\nUser: hi"
        );
        assert_eq!(GeminiProvider::flatten_prompt("", "hi"), "User: hi");
    }

    #[tokio::test]
    async fn error_401_maps_to_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_base_url(
            "bad-key".into(),
            "gemini-2.5-flash".into(),
            server.uri(),
        );

        let err = provider
            .complete("system", "hello", &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Auth));
    }

    #[tokio::test]
    async fn no_candidates_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_base_url(
            "key".into(),
            "gemini-2.5-flash".into(),
            server.uri(),
        );

        let err = provider
            .complete("system", "hello", &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Parse(_)));
    }
}
