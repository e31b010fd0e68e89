//! Crate-wide error taxonomy.
//!
//! Every variant carries a Korean user-facing message via its `#[error]`
//! string. `PipelineError` is what `TaskRunner` surfaces to the UI
//! collaborator; `EnrichmentError` and quality rejections never reach it
//! (they are absorbed inside `StageOrchestrator::run_competitor_enrichment_with_filtering`).

use thiserror::Error;

/// Errors raised by `ProviderGateway` and the per-provider clients.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("네트워크 오류가 발생했습니다: {0}")]
    Network(#[from] reqwest::Error),

    #[error("인증에 실패했습니다. API 키 설정을 확인해주세요.")]
    Auth,

    #[error("요청 한도를 초과했습니다. 잠시 후 다시 시도해주세요.")]
    RateLimit { retry_after_secs: u64 },

    #[error("요청 시간이 초과되었습니다. 네트워크 상태를 확인해주세요.")]
    Timeout,

    #[error("AI 응답을 처리할 수 없습니다 (상태 코드: {status}): {body_snippet}")]
    Response { status: u16, body_snippet: String },

    #[error("응답을 파싱할 수 없습니다: {0}")]
    Parse(String),

    #[error("AI 제공자가 설정되지 않았습니다.")]
    NotConfigured,
}

/// Errors raised while validating pipeline inputs before any network call.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}을(를) 입력해주세요.")]
    MissingField { field: String },

    #[error("현재 단계에서는 '{operation}'을(를) 수행할 수 없습니다.")]
    WrongStage { operation: String },

    #[error("{field}의 길이가 너무 깁니다 (최대 {max}자).")]
    TooLong { field: String, max: usize },
}

/// Enrichment-path failure for a single competitor URL. Absorbed locally;
/// never surfaces past Stage D.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("HTTP 요청 실패: {0}")]
    Http(String),

    #[error("브라우저 폴백 실패: {0}")]
    Browser(String),

    #[error("본문을 추출할 수 없습니다")]
    EmptyBody,
}

/// Top-level error surfaced by `TaskRunner`'s `error` event.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("작업이 취소되었습니다.")]
    Cancelled,

    #[error("알 수 없는 오류가 발생했습니다: {0}")]
    Internal(String),
}

impl PipelineError {
    /// The taxonomy tag used in `TaskEvent::Error { kind, .. }`.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "ValidationError",
            PipelineError::Provider(LlmError::Auth) => "ProviderAuthError",
            PipelineError::Provider(LlmError::RateLimit { .. }) => "ProviderRateLimitError",
            PipelineError::Provider(LlmError::Timeout) => "ProviderTimeoutError",
            PipelineError::Provider(LlmError::Response { .. } | LlmError::Parse(_)) => {
                "ProviderResponseError"
            }
            PipelineError::Provider(LlmError::Network(_) | LlmError::NotConfigured) => {
                "ProviderResponseError"
            }
            PipelineError::Cancelled => "Cancelled",
            PipelineError::Internal(_) => "InternalError",
        }
    }
}

/// Errors raised by the config layer (§6 persisted-state surface).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("설정 파일을 찾을 수 없습니다: {path}")]
    FileNotFound { path: String },

    #[error("{field} 설정이 필요합니다")]
    MissingField { field: String },

    #[error("설정 값이 올바르지 않습니다 ({field}): {message}")]
    InvalidValue { field: String, message: String },

    #[error("설정 파일을 해석할 수 없습니다")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    #[error("설정 파일을 저장할 수 없습니다: {0}")]
    WriteFailed(String),
}
