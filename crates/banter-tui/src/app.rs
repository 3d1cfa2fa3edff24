// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
//! The application event loop.
//!
//! The [`ChatSession`] lives in a background task that owns the network
//! stream; the UI talks to it over channels.  Stopping a reply drops the
//! in-flight stream in that task, which cancels the HTTP request, while the
//! conversation state drops any delta that still races in.

use std::path::Path;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::layout::{Constraint, Layout, Position};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use banter_config::Config;
use banter_core::{
    CommandRecognizer, Conversation, DictationCapture, MessageId, RecognitionEvent,
    SpeechRecognizer,
};
use banter_model::{Attachment, ChatSession, StreamEvent};

use crate::commands::{self, Command};
use crate::render;

/// Outcome of one model turn, reported by the session task.
pub(crate) enum TurnEvent {
    Delta(MessageId, String),
    Completed(MessageId),
    Failed(MessageId),
}

pub(crate) struct SendRequest {
    id: MessageId,
    text: String,
    attachments: Vec<Attachment>,
}

/// A staged attachment, kept with its file name for display.
struct Pending {
    name: String,
    attachment: Attachment,
}

pub struct App {
    config: Config,
    conversation: Conversation,
    input: String,
    /// Byte offset into `input`, always on a char boundary.
    cursor: usize,
    pending: Vec<Pending>,
    capture: DictationCapture,
    notice: Option<String>,
    scroll: usize,
    /// Follow the stream tail; manual scrolling turns this off.
    follow: bool,
    model_label: String,
    submit_tx: mpsc::Sender<SendRequest>,
    stop_tx: mpsc::Sender<()>,
    events: Option<mpsc::Receiver<TurnEvent>>,
    want_dictation: bool,
    should_quit: bool,
}

impl App {
    /// Build the app and spawn the session task that owns `session`.
    pub fn new(config: Config, session: ChatSession) -> Self {
        let model_label = format!("{}/{}", session.provider_name(), session.model_name());
        let (submit_tx, submit_rx) = mpsc::channel(4);
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let (event_tx, event_rx) = mpsc::channel(64);
        tokio::spawn(session_task(session, submit_rx, event_tx, stop_rx));

        let mut conversation = Conversation::new();
        conversation.push_welcome(config.chat.welcome.clone());

        Self {
            config,
            conversation,
            input: String::new(),
            cursor: 0,
            pending: Vec::new(),
            capture: DictationCapture::new(),
            notice: None,
            scroll: 0,
            follow: true,
            model_label,
            submit_tx,
            stop_tx,
            events: Some(event_rx),
            want_dictation: false,
            should_quit: false,
        }
    }

    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let mut events = self.events.take().expect("run called twice");
        let mut dictation: Option<mpsc::Receiver<RecognitionEvent>> = None;
        let mut term_events = EventStream::new();

        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;

            tokio::select! {
                Some(ev) = events.recv() => self.on_turn_event(ev),
                Some(Ok(ev)) = term_events.next() => self.on_term_event(ev),
                ev = recv_recognition(&mut dictation), if dictation.is_some() => {
                    match ev {
                        Some(ev) => self.on_recognition(&ev),
                        None => {
                            self.capture.stop();
                            dictation = None;
                        }
                    }
                }
            }

            if self.want_dictation {
                self.want_dictation = false;
                dictation = self.start_dictation();
            }
            if dictation.is_some() && !self.capture.is_listening() {
                // dropping the receiver kills the recognizer backend
                dictation = None;
            }
        }
        Ok(())
    }

    fn on_turn_event(&mut self, ev: TurnEvent) {
        match ev {
            TurnEvent::Delta(id, chunk) => self.conversation.apply_delta(id, &chunk),
            TurnEvent::Completed(id) => self.conversation.complete_turn(id),
            TurnEvent::Failed(id) => self.conversation.fail_turn(id),
        }
    }

    fn on_term_event(&mut self, ev: Event) {
        match ev {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.on_key(key),
            Event::Paste(text) => self.insert(&text),
            _ => {}
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        self.notice = None;
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.should_quit = true,
            (KeyCode::Enter, _) => self.submit(),
            (KeyCode::Esc, _) => {
                if self.capture.is_listening() {
                    self.capture.stop();
                } else {
                    self.stop_streaming();
                }
            }
            (KeyCode::Backspace, _) => {
                if let Some(prev) = prev_boundary(&self.input, self.cursor) {
                    self.input.replace_range(prev..self.cursor, "");
                    self.cursor = prev;
                }
            }
            (KeyCode::Delete, _) => {
                if let Some(next) = next_boundary(&self.input, self.cursor) {
                    self.input.replace_range(self.cursor..next, "");
                }
            }
            (KeyCode::Left, _) => {
                if let Some(prev) = prev_boundary(&self.input, self.cursor) {
                    self.cursor = prev;
                }
            }
            (KeyCode::Right, _) => {
                if let Some(next) = next_boundary(&self.input, self.cursor) {
                    self.cursor = next;
                }
            }
            (KeyCode::Home, _) => self.cursor = 0,
            (KeyCode::End, _) => self.cursor = self.input.len(),
            (KeyCode::PageUp, _) => {
                self.follow = false;
                self.scroll = self.scroll.saturating_sub(10);
            }
            (KeyCode::PageDown, _) => {
                // draw() clamps; once the tail is visible, follow again
                self.scroll = self.scroll.saturating_add(10);
                self.follow = true;
            }
            (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => {
                self.insert(&c.to_string());
            }
            _ => {}
        }
    }

    fn insert(&mut self, text: &str) {
        self.input.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn submit(&mut self) {
        let text = self.input.trim().to_string();
        if let Some(parsed) = commands::parse(&text) {
            self.input.clear();
            self.cursor = 0;
            match parsed {
                Ok(cmd) => self.run_command(cmd),
                Err(msg) => self.notice = Some(msg),
            }
            return;
        }
        if text.is_empty() && self.pending.is_empty() {
            return;
        }
        if self.conversation.is_streaming() {
            self.notice = Some("a reply is still streaming (Esc stops it)".into());
            return;
        }
        self.capture.stop();
        let attachments: Vec<Attachment> =
            self.pending.iter().map(|p| p.attachment.clone()).collect();
        let Some(id) = self.conversation.begin_turn(text.clone(), attachments.clone()) else {
            return;
        };
        debug!(%id, "submitting turn");
        if self.submit_tx.try_send(SendRequest { id, text, attachments }).is_err() {
            self.conversation.fail_turn(id);
        }
        self.pending.clear();
        self.input.clear();
        self.cursor = 0;
        self.follow = true;
    }

    fn run_command(&mut self, cmd: Command) {
        match cmd {
            Command::Attach(path) => self.attach(&path),
            Command::Detach => {
                match self.pending.pop() {
                    Some(p) => self.notice = Some(format!("removed {}", p.name)),
                    None => self.notice = Some("no attachments staged".into()),
                }
            }
            Command::Dictate => {
                if self.capture.is_listening() {
                    self.capture.stop();
                } else {
                    self.want_dictation = true;
                }
            }
            Command::Quit => self.should_quit = true,
        }
    }

    fn attach(&mut self, path: &Path) {
        match banter_image::encode_file(path, self.config.chat.max_attachment_bytes) {
            Ok(enc) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.notice = Some(format!("attached {name} ({})", enc.mime_type));
                self.pending.push(Pending {
                    name,
                    attachment: Attachment::new(enc.mime_type, enc.data),
                });
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn stop_streaming(&mut self) {
        if self.conversation.stop() {
            let _ = self.stop_tx.try_send(());
        }
    }

    fn start_dictation(&mut self) -> Option<mpsc::Receiver<RecognitionEvent>> {
        let Some(command) = self.config.dictation.command.clone() else {
            self.notice = Some("dictation.command is not configured".into());
            return None;
        };
        let recognizer = CommandRecognizer::new(command);
        match recognizer.listen(&self.config.dictation.locale) {
            Ok(rx) => {
                self.capture.start(&self.input);
                Some(rx)
            }
            Err(e) => {
                self.notice = Some(format!("dictation failed: {e}"));
                None
            }
        }
    }

    fn on_recognition(&mut self, ev: &RecognitionEvent) {
        if let Some(text) = self.capture.apply(ev) {
            self.cursor = text.len();
            self.input = text;
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let [chat_area, input_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let ascii = self.config.tui.ascii;
        let lines = render::conversation_lines(
            self.conversation.messages(),
            chat_area.width.saturating_sub(1),
            ascii,
        );
        let max_scroll = lines.len().saturating_sub(chat_area.height as usize);
        if self.follow {
            self.scroll = max_scroll;
        } else {
            self.scroll = self.scroll.min(max_scroll);
        }
        frame.render_widget(
            Paragraph::new(lines).scroll((self.scroll as u16, 0)),
            chat_area,
        );

        let inner_width = input_area.width.saturating_sub(2).max(1) as usize;
        let cursor_col = self.input[..self.cursor].chars().count();
        let hscroll = cursor_col.saturating_sub(inner_width - 1);
        frame.render_widget(
            Paragraph::new(self.input.as_str())
                .scroll((0, hscroll as u16))
                .block(Block::bordered().title("banter")),
            input_area,
        );
        frame.set_cursor_position(Position::new(
            input_area.x + 1 + (cursor_col - hscroll) as u16,
            input_area.y + 1,
        ));

        frame.render_widget(self.status_line(ascii), status_area);
    }

    fn status_line(&self, ascii: bool) -> Line<'static> {
        let mut spans = vec![Span::styled(
            self.model_label.clone(),
            Style::default().fg(Color::Cyan),
        )];
        let sep = if ascii { " | " } else { " · " };
        if self.conversation.is_streaming() {
            spans.push(Span::raw(sep.to_string()));
            spans.push(Span::styled(
                "streaming (Esc stops)".to_string(),
                Style::default().fg(Color::Yellow),
            ));
        }
        if self.capture.is_listening() {
            spans.push(Span::raw(sep.to_string()));
            spans.push(Span::styled(
                "listening".to_string(),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ));
        }
        if !self.pending.is_empty() {
            let names: Vec<&str> = self.pending.iter().map(|p| p.name.as_str()).collect();
            spans.push(Span::raw(sep.to_string()));
            spans.push(Span::styled(
                format!("attached: {}", names.join(", ")),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if let Some(notice) = &self.notice {
            spans.push(Span::raw(sep.to_string()));
            spans.push(Span::styled(notice.clone(), Style::default().fg(Color::Red)));
        }
        Line::from(spans)
    }
}

async fn recv_recognition(
    rx: &mut Option<mpsc::Receiver<RecognitionEvent>>,
) -> Option<RecognitionEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn prev_boundary(s: &str, at: usize) -> Option<usize> {
    s[..at].char_indices().next_back().map(|(i, _)| i)
}

fn next_boundary(s: &str, at: usize) -> Option<usize> {
    s[at..].chars().next().map(|c| at + c.len_utf8())
}

enum Outcome {
    Done,
    Stopped,
    Failed,
}

/// Owns the [`ChatSession`] and runs one request at a time.
///
/// A stop signal breaks the forwarding loop, which drops the stream and with
/// it the underlying connection.  Partial replies are still committed to the
/// session history so the model sees what the user saw.
async fn session_task(
    mut session: ChatSession,
    mut submit_rx: mpsc::Receiver<SendRequest>,
    event_tx: mpsc::Sender<TurnEvent>,
    mut stop_rx: mpsc::Receiver<()>,
) {
    while let Some(req) = submit_rx.recv().await {
        // stale stop presses from between turns
        while stop_rx.try_recv().is_ok() {}

        let mut stream = match session.send_stream(&req.text, &req.attachments).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "opening response stream failed");
                let _ = event_tx.send(TurnEvent::Failed(req.id)).await;
                continue;
            }
        };

        let mut reply = String::new();
        let outcome = loop {
            tokio::select! {
                _ = stop_rx.recv() => break Outcome::Stopped,
                ev = stream.next() => match ev {
                    Some(Ok(StreamEvent::TextDelta(chunk))) => {
                        reply.push_str(&chunk);
                        if event_tx.send(TurnEvent::Delta(req.id, chunk)).await.is_err() {
                            break Outcome::Stopped;
                        }
                    }
                    Some(Ok(StreamEvent::Done)) | None => break Outcome::Done,
                    Some(Err(e)) => {
                        warn!(error = %e, "response stream failed");
                        break Outcome::Failed;
                    }
                },
            }
        };
        drop(stream);

        match outcome {
            Outcome::Done => {
                session.record_reply(&reply);
                let _ = event_tx.send(TurnEvent::Completed(req.id)).await;
            }
            Outcome::Stopped => {
                if !reply.is_empty() {
                    session.record_reply(&reply);
                }
            }
            Outcome::Failed => {
                let _ = event_tx.send(TurnEvent::Failed(req.id)).await;
            }
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use banter_core::FAILURE_TEXT;
    use banter_model::ScriptedMockProvider;

    fn app_with(provider: ScriptedMockProvider) -> App {
        App::new(Config::default(), ChatSession::new(Box::new(provider), None))
    }

    async fn drain_turn(app: &mut App) {
        while let Some(ev) = app.events.as_mut().unwrap().recv().await {
            let done = matches!(ev, TurnEvent::Completed(_) | TurnEvent::Failed(_));
            app.on_turn_event(ev);
            if done {
                break;
            }
        }
    }

    // 1×1 red PNG (valid minimal PNG)
    const MINIMAL_PNG: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, // PNG signature
        0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1×1
        0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, // bit depth 8, RGB
        0xde, 0x00, 0x00, 0x00, 0x0c, 0x49, 0x44, 0x41, // IDAT length + "IDAT"
        0x54, 0x78, 0x9c, 0x63, 0xf8, 0xcf, 0xc0, 0x00, // compressed pixel (red)
        0x00, 0x03, 0x01, 0x01, 0x00, 0xc9, 0xfe, 0x92, // IDAT CRC
        0xef, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, // IEND
        0x44, 0xae, 0x42, 0x60, 0x82, // IEND CRC
    ];

    #[tokio::test]
    async fn submit_streams_a_reply_into_the_conversation() {
        let mut app = app_with(ScriptedMockProvider::chunks(&["Hel", "lo!"]));
        app.insert("hi there");
        app.submit();
        assert!(app.input.is_empty());
        assert!(app.conversation.is_streaming());
        drain_turn(&mut app).await;
        let msgs = app.conversation.messages();
        // welcome, user, reply
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[2].text, "Hello!");
        assert!(!msgs[2].is_streaming);
    }

    #[tokio::test]
    async fn provider_failure_marks_the_turn_errored() {
        let mut app = app_with(ScriptedMockProvider::failing("boom"));
        app.insert("q");
        app.submit();
        drain_turn(&mut app).await;
        let last = app.conversation.messages().last().unwrap();
        assert!(last.is_error);
        assert_eq!(last.text, FAILURE_TEXT);
    }

    #[tokio::test]
    async fn second_submit_while_streaming_sets_a_notice() {
        let mut app = app_with(ScriptedMockProvider::chunks(&["x"]));
        app.insert("one");
        app.submit();
        let before = app.conversation.messages().len();
        app.insert("two");
        app.submit();
        assert!(app.notice.is_some());
        assert_eq!(app.conversation.messages().len(), before);
    }

    #[tokio::test]
    async fn empty_submit_is_ignored() {
        let mut app = app_with(ScriptedMockProvider::chunks(&["x"]));
        app.insert("   ");
        app.submit();
        assert_eq!(app.conversation.messages().len(), 1); // welcome only
    }

    #[tokio::test]
    async fn unknown_command_is_a_notice_not_a_message() {
        let mut app = app_with(ScriptedMockProvider::chunks(&["x"]));
        app.insert("/frobnicate");
        app.submit();
        assert_eq!(app.conversation.messages().len(), 1);
        assert!(app.notice.as_deref().unwrap().contains("unknown command"));
    }

    #[tokio::test]
    async fn attach_stages_a_file_and_detach_unstages_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        std::fs::write(&path, MINIMAL_PNG).unwrap();

        let mut app = app_with(ScriptedMockProvider::chunks(&["x"]));
        app.insert(&format!("/attach {}", path.display()));
        app.submit();
        assert_eq!(app.pending.len(), 1);
        assert_eq!(app.pending[0].attachment.mime_type, "image/png");

        app.insert("/detach");
        app.submit();
        assert!(app.pending.is_empty());
    }

    #[tokio::test]
    async fn rejected_attachment_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let text_file = dir.path().join("notes.txt");
        std::fs::write(&text_file, b"just text").unwrap();
        let png = dir.path().join("dot.png");
        std::fs::write(&png, MINIMAL_PNG).unwrap();

        let mut app = app_with(ScriptedMockProvider::chunks(&["x"]));
        let before = app.conversation.messages().len();

        // not an image
        app.insert(&format!("/attach {}", text_file.display()));
        app.submit();
        assert!(app.pending.is_empty());
        assert!(app.notice.is_some());

        // oversized
        app.config.chat.max_attachment_bytes = 4;
        app.insert(&format!("/attach {}", png.display()));
        app.submit();
        assert!(app.pending.is_empty());
        assert!(app.notice.as_deref().unwrap().contains("too large"));

        assert_eq!(app.conversation.messages().len(), before);
    }

    #[tokio::test]
    async fn attachments_are_sent_with_the_message_and_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        std::fs::write(&path, MINIMAL_PNG).unwrap();

        let provider = ScriptedMockProvider::chunks(&["ok"]);
        let seen = provider.last_history.clone();
        let mut app = app_with(provider);
        app.insert(&format!("/attach {}", path.display()));
        app.submit();
        app.insert("describe this");
        app.submit();
        drain_turn(&mut app).await;

        assert!(app.pending.is_empty());
        let history = seen.lock().unwrap().clone().unwrap();
        assert_eq!(history[0].parts.len(), 2);
        let user_msg = &app.conversation.messages()[1];
        assert_eq!(user_msg.attachments.len(), 1);
    }

    #[tokio::test]
    async fn stop_keeps_partial_text_and_drops_late_deltas() {
        let mut app = app_with(ScriptedMockProvider::chunks(&["part", "ial"]));
        app.insert("q");
        app.submit();
        // apply the first delta, then the user hits Esc
        let first = app.events.as_mut().unwrap().recv().await.unwrap();
        app.on_turn_event(first);
        app.stop_streaming();
        // remaining events are late and must not mutate the message
        while let Ok(ev) = app.events.as_mut().unwrap().try_recv() {
            app.on_turn_event(ev);
        }
        let last = app.conversation.messages().last().unwrap();
        assert_eq!(last.text, "part");
        assert!(!last.is_streaming);
        assert!(!last.is_error);
    }

    #[tokio::test]
    async fn dictate_without_a_command_sets_a_notice() {
        let mut app = app_with(ScriptedMockProvider::chunks(&["x"]));
        app.insert("/dictate");
        app.submit();
        assert!(app.want_dictation);
        app.want_dictation = false;
        assert!(app.start_dictation().is_none());
        assert!(app.notice.is_some());
    }

    #[tokio::test]
    async fn dictation_composes_into_the_input_line() {
        let mut app = app_with(ScriptedMockProvider::chunks(&["x"]));
        app.insert("note:");
        let base = app.input.clone();
        app.capture.start(&base);
        app.on_recognition(&RecognitionEvent::Result {
            interim: "hel".into(),
            finalized: String::new(),
        });
        assert_eq!(app.input, "note: hel");
        app.on_recognition(&RecognitionEvent::Result {
            interim: String::new(),
            finalized: "hello".into(),
        });
        assert_eq!(app.input, "note: hello");
        assert_eq!(app.cursor, app.input.len());
    }

    #[test]
    fn cursor_helpers_respect_utf8_boundaries() {
        let s = "aé→";
        let mut at = s.len();
        let mut seen = Vec::new();
        while let Some(prev) = prev_boundary(s, at) {
            seen.push(prev);
            at = prev;
        }
        assert_eq!(seen, vec![3, 1, 0]);
        assert_eq!(next_boundary(s, 0), Some(1));
        assert_eq!(next_boundary(s, s.len()), None);
    }
}
