//! Static registry mapping a UI-facing display name to an (id, provider,
//! role, default caps, is-test-candidate) record. Immutable at runtime;
//! unknown names fall through unchanged with a warning rather than erroring
//! (per §9, "implicit model-name -> wire-name mapping lives in the model
//! registry").

use crate::model::Provider;

/// Whether a model belongs to OpenAI's reasoning family: uses
/// `max_completion_tokens`, forbids `temperature`, optionally accepts
/// `reasoning.effort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Standard,
    Reasoning,
}

#[derive(Debug, Clone, Copy)]
pub struct AIModel {
    pub display_name: &'static str,
    pub wire_id: &'static str,
    pub provider: Provider,
    pub kind: ModelKind,
    pub default_max_tokens: u32,
    pub is_test_model: bool,
}

const MODELS: &[AIModel] = &[
    AIModel {
        display_name: "claude-sonnet-4",
        wire_id: "claude-sonnet-4-20250514",
        provider: Provider::Anthropic,
        kind: ModelKind::Standard,
        default_max_tokens: 8192,
        is_test_model: false,
    },
    AIModel {
        display_name: "claude-opus-4-1",
        wire_id: "claude-opus-4-1-20250805",
        provider: Provider::Anthropic,
        kind: ModelKind::Standard,
        default_max_tokens: 8192,
        is_test_model: false,
    },
    AIModel {
        display_name: "claude-haiku-3-5",
        wire_id: "claude-3-5-haiku-20241022",
        provider: Provider::Anthropic,
        kind: ModelKind::Standard,
        default_max_tokens: 8192,
        is_test_model: true,
    },
    AIModel {
        display_name: "gpt-5",
        wire_id: "gpt-5",
        provider: Provider::Openai,
        kind: ModelKind::Reasoning,
        default_max_tokens: 4000,
        is_test_model: false,
    },
    AIModel {
        display_name: "gpt-5-mini",
        wire_id: "gpt-5-mini",
        provider: Provider::Openai,
        kind: ModelKind::Reasoning,
        default_max_tokens: 4000,
        is_test_model: false,
    },
    AIModel {
        display_name: "gpt-5-nano",
        wire_id: "gpt-5-nano",
        provider: Provider::Openai,
        kind: ModelKind::Reasoning,
        default_max_tokens: 4000,
        is_test_model: true,
    },
    AIModel {
        display_name: "gpt-4o",
        wire_id: "gpt-4o",
        provider: Provider::Openai,
        kind: ModelKind::Standard,
        default_max_tokens: 2000,
        is_test_model: false,
    },
    AIModel {
        display_name: "gemini-2-5-pro",
        wire_id: "gemini-2.5-pro",
        provider: Provider::Gemini,
        kind: ModelKind::Standard,
        default_max_tokens: 8192,
        is_test_model: false,
    },
    AIModel {
        display_name: "gemini-2-5-flash",
        wire_id: "gemini-2.5-flash",
        provider: Provider::Gemini,
        kind: ModelKind::Standard,
        default_max_tokens: 8192,
        is_test_model: false,
    },
    AIModel {
        display_name: "gemini-2-0-flash",
        wire_id: "gemini-2.0-flash",
        provider: Provider::Gemini,
        kind: ModelKind::Standard,
        default_max_tokens: 8192,
        is_test_model: true,
    },
];

/// Look up a model by its UI-facing display name. Returns `None` for
/// unknown names; callers should dispatch with the raw name unchanged and
/// log a warning rather than erroring.
pub fn lookup(display_name: &str) -> Option<AIModel> {
    MODELS.iter().find(|m| m.display_name == display_name).copied()
}
