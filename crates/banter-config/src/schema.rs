// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub dictation: DictationConfig,
    #[serde(default)]
    pub tui: TuiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider identifier: "gemini" | "mock"
    pub provider: String,
    /// Model name forwarded to the provider API
    pub name: String,
    /// Environment variable that holds the API key (read at runtime)
    pub api_key_env: Option<String>,
    /// Explicit API key; prefer api_key_env in config files to avoid secrets
    /// in version-controlled files
    pub api_key: Option<String>,
    /// Base URL override.  Useful for local proxies.
    pub base_url: Option<String>,
    /// Maximum tokens to request in a single completion
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0–2.0)
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            name: "gemini-2.5-flash".into(),
            api_key_env: Some("GEMINI_API_KEY".into()),
            api_key: None,
            base_url: None,
            max_tokens: None,
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// System instruction sent with every session.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Greeting shown as the first model message when a session opens.
    #[serde(default = "default_welcome")]
    pub welcome: String,
    /// Maximum attachment size in bytes before the encoder rejects a file.
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,
}

fn default_system_prompt() -> String {
    "You are a helpful, intelligent, and precise AI assistant. You answer \
     questions clearly using Markdown formatting where appropriate. You can \
     analyze images if provided."
        .into()
}

fn default_welcome() -> String {
    "Hello! How can I help you today? Attach images with /attach <path>.".into()
}

fn default_max_attachment_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            welcome: default_welcome(),
            max_attachment_bytes: default_max_attachment_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictationConfig {
    /// Recognition locale passed to the speech backend.
    #[serde(default = "default_locale")]
    pub locale: String,
    /// External transcription command.  Run once per utterance; its stdout
    /// becomes the final transcript.  Dictation is unavailable when unset.
    pub command: Option<String>,
}

fn default_locale() -> String {
    "en-US".into()
}

impl Default for DictationConfig {
    fn default() -> Self {
        Self { locale: default_locale(), command: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiConfig {
    /// Use plain ASCII instead of Unicode glyphs for spinners and chrome.
    #[serde(default)]
    pub ascii: bool,
}

#[allow(clippy::derivable_impls)]
impl Default for TuiConfig {
    fn default() -> Self {
        Self { ascii: false }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_gemini() {
        let cfg = Config::default();
        assert_eq!(cfg.model.provider, "gemini");
        assert_eq!(cfg.model.api_key_env.as_deref(), Some("GEMINI_API_KEY"));
        assert!(cfg.model.api_key.is_none());
    }

    #[test]
    fn default_attachment_cap_is_ten_mib() {
        let cfg = ChatConfig::default();
        assert_eq!(cfg.max_attachment_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn empty_toml_deserialises_to_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.model.name, "gemini-2.5-flash");
        assert_eq!(cfg.dictation.locale, "en-US");
        assert!(cfg.dictation.command.is_none());
        assert!(!cfg.tui.ascii);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"[chat]
max_attachment_bytes = 1024"#,
        )
        .unwrap();
        assert_eq!(cfg.chat.max_attachment_bytes, 1024);
        assert!(!cfg.chat.system_prompt.is_empty());
        assert!(!cfg.chat.welcome.is_empty());
    }
}
