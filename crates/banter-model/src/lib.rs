// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
mod types;
mod provider;
mod gemini;
mod mock;
mod session;

pub use types::*;
pub use provider::{ChatProvider, ChunkStream};
pub use gemini::GeminiProvider;
pub use mock::{MockProvider, ScriptedMockProvider};
pub use session::ChatSession;

use anyhow::bail;
use banter_config::ModelConfig;

/// Construct a boxed [`ChatProvider`] from configuration.
///
/// Provider selection:
/// - `"gemini"` → [`GeminiProvider`]
/// - `"mock"` → [`MockProvider`] (echo-back, for offline use and tests)
pub fn from_config(cfg: &ModelConfig) -> anyhow::Result<Box<dyn ChatProvider>> {
    let key = resolve_api_key(cfg);
    match cfg.provider.as_str() {
        "gemini" => Ok(Box::new(GeminiProvider::new(
            cfg.name.clone(),
            key,
            cfg.base_url.clone(),
            cfg.max_tokens,
            cfg.temperature,
        ))),
        "mock" => Ok(Box::new(MockProvider)),
        other => bail!("unknown model provider: {other}"),
    }
}

fn resolve_api_key(cfg: &ModelConfig) -> Option<String> {
    if let Some(k) = &cfg.api_key {
        return Some(k.clone());
    }
    if let Some(env) = &cfg.api_key_env {
        return std::env::var(env).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_selects_gemini() {
        let cfg = ModelConfig::default();
        let p = from_config(&cfg).unwrap();
        assert_eq!(p.name(), "gemini");
    }

    #[test]
    fn from_config_selects_mock() {
        let cfg = ModelConfig { provider: "mock".into(), ..ModelConfig::default() };
        let p = from_config(&cfg).unwrap();
        assert_eq!(p.name(), "mock");
    }

    #[test]
    fn from_config_rejects_unknown_provider() {
        let cfg = ModelConfig { provider: "does-not-exist".into(), ..ModelConfig::default() };
        assert!(from_config(&cfg).is_err());
    }

    #[test]
    fn resolve_api_key_prefers_explicit_key() {
        let cfg = ModelConfig {
            api_key: Some("abc".into()),
            api_key_env: Some("BANTER_TEST_UNSET_VAR".into()),
            ..ModelConfig::default()
        };
        assert_eq!(resolve_api_key(&cfg), Some("abc".into()));
    }
}
