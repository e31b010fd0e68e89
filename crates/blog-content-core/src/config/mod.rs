//! Configuration management for the blog content pipeline.
//!
//! Supports the same three-layer loading the teacher uses:
//! 1. Built-in defaults
//! 2. TOML config file (`~/.blog-content/config.toml`)
//! 3. Environment variable overrides (`BLOG_CONTENT_` prefix)
//!
//! The three named blobs in §6 (writing settings, provider selections, API
//! keys) are modeled as one aggregate `Config` on disk for CLI convenience;
//! the core itself treats each section as an opaque, independently-replaced
//! blob and never assumes the others are present.

pub mod types;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
pub use types::{ApiKeysConfig, ProviderSelectionConfig, RoleSelection, WritingSettingsConfig};

/// Top-level on-disk configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub writing: WritingSettingsConfig,

    #[serde(default)]
    pub providers: ProviderSelectionConfig,

    #[serde(default)]
    pub api_keys: ApiKeysConfig,
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when
    /// no path was given and the default path does not exist.
    pub fn load(config_path: Option<&str>) -> Result<Config, ConfigError> {
        let (path, explicit) = Self::resolve_config_path(config_path);

        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                toml::from_str::<Config>(&contents).map_err(|e| ConfigError::ParseError { source: e })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if explicit {
                    return Err(ConfigError::FileNotFound { path: path.display().to_string() });
                }
                Config::default()
            }
            Err(_) => {
                return Err(ConfigError::FileNotFound { path: path.display().to_string() });
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Persist the whole config blob to `path`, replacing it entirely (the
    /// settings store is read-mostly; writes always replace the whole blob,
    /// never merge in place).
    pub fn save(&self, config_path: Option<&str>) -> Result<(), ConfigError> {
        let (path, _) = Self::resolve_config_path(config_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFailed(e.to_string()))?;
        }
        let serialized =
            toml::to_string_pretty(self).map_err(|e| ConfigError::WriteFailed(e.to_string()))?;
        std::fs::write(&path, serialized).map_err(|e| ConfigError::WriteFailed(e.to_string()))
    }

    fn resolve_config_path(config_path: Option<&str>) -> (PathBuf, bool) {
        if let Some(path) = config_path {
            return (expand_tilde(path), true);
        }
        if let Ok(env_path) = env::var("BLOG_CONTENT_CONFIG") {
            return (expand_tilde(&env_path), true);
        }
        (expand_tilde("~/.blog-content/config.toml"), false)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("BLOG_CONTENT_API_KEYS__ANTHROPIC") {
            self.api_keys.anthropic = Some(val);
        }
        if let Ok(val) = env::var("BLOG_CONTENT_API_KEYS__OPENAI") {
            self.api_keys.openai = Some(val);
        }
        if let Ok(val) = env::var("BLOG_CONTENT_API_KEYS__GEMINI") {
            self.api_keys.gemini = Some(val);
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_default_path_yields_defaults() {
        let config = Config::load(Some("/nonexistent/path/should/not/exist.toml"));
        assert!(matches!(config, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = std::env::temp_dir().join(format!(
            "blog-content-core-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let path_str = path.to_str().unwrap();

        let mut config = Config::default();
        config.api_keys.anthropic = Some("sk-ant-test".into());
        config.save(Some(path_str)).expect("save");

        let loaded = Config::load(Some(path_str)).expect("load");
        assert_eq!(loaded.api_keys.anthropic.as_deref(), Some("sk-ant-test"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn env_override_wins_over_file_value() {
        let dir = std::env::temp_dir().join(format!(
            "blog-content-core-test-env-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let path_str = path.to_str().unwrap();
        Config::default().save(Some(path_str)).expect("save");

        env::set_var("BLOG_CONTENT_API_KEYS__OPENAI", "sk-override");
        let loaded = Config::load(Some(path_str)).expect("load");
        env::remove_var("BLOG_CONTENT_API_KEYS__OPENAI");

        assert_eq!(loaded.api_keys.openai.as_deref(), Some("sk-override"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn expand_tilde_resolves_home() {
        let expanded = expand_tilde("~/.blog-content/config.toml");
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
