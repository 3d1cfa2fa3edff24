// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
//! Google Gemini driver — native Generative Language API.
//!
//! Uses the `streamGenerateContent` endpoint with SSE framing.
//!
//! # Auth
//! API key via the `x-goog-api-key` header; the key itself comes from
//! configuration or a named environment variable, never from source.
//!
//! # Endpoint pattern
//! `POST https://generativelanguage.googleapis.com/v1beta/models/{model}:streamGenerateContent?alt=sse`

use anyhow::{bail, Context};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::debug;

use crate::{provider::ChunkStream, StreamEvent, Turn};

pub struct GeminiProvider {
    model: String,
    api_key: Option<String>,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Self {
        Self {
            model,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://generativelanguage.googleapis.com".into()),
            max_tokens: max_tokens.unwrap_or(8192),
            temperature: temperature.unwrap_or(0.7),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl crate::ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_stream(
        &self,
        system_instruction: Option<&str>,
        history: &[Turn],
    ) -> anyhow::Result<ChunkStream> {
        let key = self.api_key.as_deref().context("GEMINI_API_KEY not set")?;

        let body = build_request_body(
            system_instruction,
            history,
            self.max_tokens,
            self.temperature,
        )?;

        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            self.model,
        );

        debug!(model = %self.model, turns = history.len(), "sending Gemini request");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Gemini error {status}: {text}");
        }

        let byte_stream = resp.bytes_stream();
        let event_stream = byte_stream.flat_map(|chunk| {
            let lines = match chunk {
                Ok(b) => String::from_utf8_lossy(&b).to_string(),
                Err(e) => return futures::stream::iter(vec![Err(anyhow::anyhow!(e))]),
            };
            let events: Vec<anyhow::Result<StreamEvent>> = lines
                .lines()
                .filter_map(|line| {
                    let line = line.strip_prefix("data: ")?.trim();
                    if line == "[DONE]" {
                        return Some(Ok(StreamEvent::Done));
                    }
                    let v: Value = serde_json::from_str(line).ok()?;
                    Some(Ok(parse_gemini_chunk(&v)))
                })
                .collect();
            futures::stream::iter(events)
        });

        Ok(Box::pin(event_stream))
    }
}

/// Build the JSON request body: `contents` from the turn history plus the
/// optional `systemInstruction` and the `generationConfig` section.
fn build_request_body(
    system_instruction: Option<&str>,
    history: &[Turn],
    max_tokens: u32,
    temperature: f32,
) -> anyhow::Result<Value> {
    let contents = serde_json::to_value(history).context("serialising turn history")?;

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "maxOutputTokens": max_tokens,
            "temperature": temperature,
        }
    });
    if let Some(sys) = system_instruction {
        body["systemInstruction"] = json!({ "parts": [{ "text": sys }] });
    }
    Ok(body)
}

fn parse_gemini_chunk(v: &Value) -> StreamEvent {
    let candidate = &v["candidates"][0];
    let content = &candidate["content"];
    let parts = match content["parts"].as_array() {
        Some(p) => p,
        None => {
            // finishReason without parts → stream finished
            if candidate["finishReason"].as_str().is_some() {
                return StreamEvent::Done;
            }
            return StreamEvent::TextDelta(String::new());
        }
    };

    for part in parts {
        if let Some(text) = part["text"].as_str() {
            return StreamEvent::TextDelta(text.to_string());
        }
    }

    if candidate["finishReason"].as_str().is_some() {
        return StreamEvent::Done;
    }

    StreamEvent::TextDelta(String::new())
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attachment, ChatProvider};

    #[test]
    fn provider_name() {
        let p = GeminiProvider::new("gemini-2.5-flash".into(), None, None, None, None);
        assert_eq!(p.name(), "gemini");
        assert_eq!(p.model_name(), "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_network_io() {
        let p = GeminiProvider::new("gemini-2.5-flash".into(), None, None, None, None);
        let err = p.send_stream(None, &[Turn::user("hi")]).await.map(|_| ()).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn text_delta_parsed() {
        let v = json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "hello" }]
                }
            }]
        });
        assert_eq!(parse_gemini_chunk(&v), StreamEvent::TextDelta("hello".into()));
    }

    #[test]
    fn finish_reason_without_parts_is_done() {
        let v = json!({
            "candidates": [{ "finishReason": "STOP" }]
        });
        assert_eq!(parse_gemini_chunk(&v), StreamEvent::Done);
    }

    #[test]
    fn empty_chunk_yields_empty_delta() {
        let v = json!({ "candidates": [{}] });
        assert_eq!(parse_gemini_chunk(&v), StreamEvent::TextDelta(String::new()));
    }

    #[test]
    fn body_contains_system_instruction_and_generation_config() {
        let body = build_request_body(Some("be brief"), &[Turn::user("q")], 1024, 0.5).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "q");
    }

    #[test]
    fn body_inline_data_follows_text_part() {
        let turn = Turn::user_with_attachments(
            "what is this?",
            &[Attachment::new("image/png", "QUJD")],
        );
        let body = build_request_body(None, &[turn], 8192, 0.7).unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["text"], "what is this?");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "QUJD");
        assert!(body.get("systemInstruction").is_none());
    }
}
