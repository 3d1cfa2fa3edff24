// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use crate::{provider::ChunkStream, StreamEvent, Turn};

/// Deterministic mock provider.  Echoes the last user turn back as the
/// model response, split into small deltas to exercise streaming paths.
#[derive(Default)]
pub struct MockProvider;

#[async_trait]
impl crate::ChatProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn send_stream(
        &self,
        _system_instruction: Option<&str>,
        history: &[Turn],
    ) -> anyhow::Result<ChunkStream> {
        let reply = history
            .iter()
            .rev()
            .find(|t| t.role == crate::TurnRole::User)
            .map(|t| t.text())
            .unwrap_or_else(|| "[no input]".into());

        let full = format!("MOCK: {reply}");
        let mut events: Vec<anyhow::Result<StreamEvent>> = full
            .split_inclusive(' ')
            .map(|w| Ok(StreamEvent::TextDelta(w.to_string())))
            .collect();
        events.push(Ok(StreamEvent::Done));
        Ok(Box::pin(stream::iter(events)))
    }
}

/// A pre-scripted mock provider.  Each call to `send_stream` pops the next
/// event script from the front of the queue, so tests can specify exact
/// chunk sequences without network access.
pub struct ScriptedMockProvider {
    scripts: Arc<Mutex<Vec<Vec<StreamEvent>>>>,
    /// When set, every stream ends with this error instead of completing.
    fail_with: Option<String>,
    /// The last turn history seen by this provider, for test inspection.
    pub last_history: Arc<Mutex<Option<Vec<Turn>>>>,
}

impl ScriptedMockProvider {
    /// Build a provider from a list of event scripts.  The outer `Vec` is
    /// the ordered list of calls; the inner `Vec` the events for that call.
    pub fn new(scripts: Vec<Vec<StreamEvent>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            fail_with: None,
            last_history: Arc::new(Mutex::new(None)),
        }
    }

    /// Convenience: provider that streams the given chunks then finishes.
    pub fn chunks(chunks: &[&str]) -> Self {
        let mut events: Vec<StreamEvent> = chunks
            .iter()
            .map(|c| StreamEvent::TextDelta((*c).to_string()))
            .collect();
        events.push(StreamEvent::Done);
        Self::new(vec![events])
    }

    /// Convenience: provider whose streams emit their script and then fail
    /// with `message` instead of completing.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(message.into()),
            last_history: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl crate::ChatProvider for ScriptedMockProvider {
    fn name(&self) -> &str {
        "scripted-mock"
    }
    fn model_name(&self) -> &str {
        "scripted-mock-model"
    }

    async fn send_stream(
        &self,
        _system_instruction: Option<&str>,
        history: &[Turn],
    ) -> anyhow::Result<ChunkStream> {
        *self.last_history.lock().unwrap() = Some(history.to_vec());

        if let Some(msg) = &self.fail_with {
            let err: Vec<anyhow::Result<StreamEvent>> = vec![Err(anyhow::anyhow!(msg.clone()))];
            return Ok(Box::pin(stream::iter(err)));
        }

        let events = {
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.is_empty() {
                vec![
                    StreamEvent::TextDelta("[no more scripts]".into()),
                    StreamEvent::Done,
                ]
            } else {
                scripts.remove(0)
            }
        };
        let wrapped: Vec<anyhow::Result<StreamEvent>> = events.into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(wrapped)))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::ChatProvider;

    async fn collect(mut s: ChunkStream) -> Vec<anyhow::Result<StreamEvent>> {
        let mut out = Vec::new();
        while let Some(ev) = s.next().await {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn mock_echoes_last_user_turn() {
        let p = MockProvider;
        let stream = p.send_stream(None, &[Turn::user("hi there")]).await.unwrap();
        let events = collect(stream).await;
        let text: String = events
            .iter()
            .filter_map(|e| match e {
                Ok(StreamEvent::TextDelta(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "MOCK: hi there");
        assert!(matches!(events.last(), Some(Ok(StreamEvent::Done))));
    }

    #[tokio::test]
    async fn scripted_chunks_arrive_in_order() {
        let p = ScriptedMockProvider::chunks(&["a", "b", "c"]);
        let events = collect(p.send_stream(None, &[Turn::user("x")]).await.unwrap()).await;
        let deltas: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                Ok(StreamEvent::TextDelta(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(deltas, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn scripted_records_history() {
        let p = ScriptedMockProvider::chunks(&["ok"]);
        let history = vec![Turn::user("first"), Turn::model("reply"), Turn::user("second")];
        let _ = p.send_stream(None, &history).await.unwrap();
        let seen = p.last_history.lock().unwrap().clone().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].text(), "second");
    }

    #[tokio::test]
    async fn failing_stream_yields_error_item() {
        let p = ScriptedMockProvider::failing("boom");
        let events = collect(p.send_stream(None, &[Turn::user("x")]).await.unwrap()).await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_err());
    }

    #[tokio::test]
    async fn scripted_fallback_when_scripts_exhausted() {
        let p = ScriptedMockProvider::new(vec![]);
        let events = collect(p.send_stream(None, &[Turn::user("x")]).await.unwrap()).await;
        assert!(matches!(
            &events[0],
            Ok(StreamEvent::TextDelta(t)) if t.contains("no more scripts")
        ));
    }
}
