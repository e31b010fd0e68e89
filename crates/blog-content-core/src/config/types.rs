//! Persisted-state section structs (§6: three named user-settings blobs).
//!
//! The core treats these as opaque key-value blobs with a known key schema
//! but does not own their storage location; the CLI front-end decides where
//! the TOML file lives.

use serde::{Deserialize, Serialize};

use crate::model::{ContentKind, ProviderRole, ReviewSubtype, Tone};

fn default_tone() -> Tone {
    Tone::PoliteFormal
}

fn default_content_kind() -> ContentKind {
    ContentKind::Guide
}

/// Persisted form of `WritingSettings` (model.rs), as loaded at startup and
/// mutated only via explicit save.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WritingSettingsConfig {
    #[serde(default = "default_content_kind")]
    pub content_kind: ContentKind,

    #[serde(default)]
    pub review_subtype: Option<ReviewSubtype>,

    #[serde(default = "default_tone")]
    pub tone: Tone,

    #[serde(default)]
    pub blogger_identity: Option<String>,
}

impl Default for WritingSettingsConfig {
    fn default() -> Self {
        Self {
            content_kind: default_content_kind(),
            review_subtype: None,
            tone: default_tone(),
            blogger_identity: None,
        }
    }
}

/// One role's (provider, display-model-name) choice.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoleSelection {
    pub role: ProviderRole,
    pub provider: String,
    pub display_model_name: String,
}

/// Persisted per-role provider selections (§3 `ProviderSelection`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderSelectionConfig {
    #[serde(default)]
    pub roles: Vec<RoleSelection>,
}

impl ProviderSelectionConfig {
    pub fn for_role(&self, role: ProviderRole) -> Option<&RoleSelection> {
        self.roles.iter().find(|r| r.role == role)
    }
}

/// Opaque provider API keys, keyed by provider name ("anthropic", "openai",
/// "gemini"). The core never logs these values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiKeysConfig {
    #[serde(default)]
    pub anthropic: Option<String>,
    #[serde(default)]
    pub openai: Option<String>,
    #[serde(default)]
    pub gemini: Option<String>,
}

impl ApiKeysConfig {
    pub fn for_provider(&self, provider: crate::model::Provider) -> Option<&str> {
        match provider {
            crate::model::Provider::Anthropic => self.anthropic.as_deref(),
            crate::model::Provider::Openai => self.openai.as_deref(),
            crate::model::Provider::Gemini => self.gemini.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writing_settings_defaults_to_guide_polite_formal() {
        let settings = WritingSettingsConfig::default();
        assert_eq!(settings.content_kind, ContentKind::Guide);
        assert_eq!(settings.tone, Tone::PoliteFormal);
        assert!(settings.review_subtype.is_none());
    }

    #[test]
    fn provider_selection_looks_up_by_role() {
        let config = ProviderSelectionConfig {
            roles: vec![RoleSelection {
                role: ProviderRole::Writing,
                provider: "anthropic".into(),
                display_model_name: "claude-sonnet-4".into(),
            }],
        };
        assert!(config.for_role(ProviderRole::Writing).is_some());
        assert!(config.for_role(ProviderRole::SummaryIdeation).is_none());
    }

    #[test]
    fn api_keys_look_up_by_provider() {
        let keys = ApiKeysConfig {
            anthropic: Some("sk-ant-test".into()),
            openai: None,
            gemini: None,
        };
        assert_eq!(keys.for_provider(crate::model::Provider::Anthropic), Some("sk-ant-test"));
        assert_eq!(keys.for_provider(crate::model::Provider::Openai), None);
    }
}
