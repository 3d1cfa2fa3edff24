// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
//! Turns formatted message segments into styled, word-wrapped Ratatui lines.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use banter_core::{format_text, Message, Role, Segment};

/// A styled line ready for Ratatui rendering.
pub type StyledLines = Vec<Line<'static>>;

/// Render the whole conversation, one blank line between messages.
///
/// `ascii` — when true, use plain ASCII characters instead of Unicode
/// glyphs so that fonts without wide Unicode support render cleanly.
pub fn conversation_lines(messages: &[Message], wrap_width: u16, ascii: bool) -> StyledLines {
    let mut lines = StyledLines::new();
    for (i, msg) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.extend(message_lines(msg, wrap_width, ascii));
    }
    lines
}

/// Render one message: a role header, attachment chips, then the body built
/// from [`format_text`] segments.
pub fn message_lines(msg: &Message, wrap_width: u16, ascii: bool) -> StyledLines {
    let width = if wrap_width == 0 { 80 } else { wrap_width as usize };
    let mut lines = vec![header_line(msg, ascii)];

    for att in &msg.attachments {
        // base64 is 4 output bytes per 3 input bytes
        let size = att.data.len() / 4 * 3;
        let chip = if ascii {
            format!("  [{} {}]", att.mime_type, human_size(size))
        } else {
            format!("  ⎘ {} · {}", att.mime_type, human_size(size))
        };
        lines.push(Line::from(Span::styled(chip, Style::default().fg(Color::DarkGray))));
    }

    let base = if msg.is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };

    let mut wrap = Wrapper { width, lines, spans: Vec::new() };
    for segment in format_text(&msg.text) {
        match segment {
            Segment::Text(t) => {
                for (i, piece) in t.split('\n').enumerate() {
                    if i > 0 {
                        wrap.break_line();
                    }
                    wrap.push_wrapped(piece, base);
                }
            }
            Segment::Bold(t) => wrap.push_wrapped(&t, base.add_modifier(Modifier::BOLD)),
            Segment::InlineCode(t) => wrap.push_atom(
                format!("`{t}`"),
                Style::default().fg(Color::Yellow).bg(Color::DarkGray),
            ),
            Segment::CodeBlock { language, code } => {
                wrap.flush();
                let rule = if ascii { '-' } else { '─' };
                wrap.lines.push(Line::from(Span::styled(
                    format!("{rule}{rule} {language}"),
                    Style::default().fg(Color::DarkGray),
                )));
                for code_line in drop_trailing_empty(code.split('\n')) {
                    wrap.lines.push(Line::from(Span::styled(
                        code_line.to_string(),
                        Style::default().fg(Color::Cyan),
                    )));
                }
            }
        }
    }

    if msg.is_streaming {
        let cursor = if ascii { "_" } else { "▌" };
        wrap.spans.push(Span::styled(cursor.to_string(), Style::default().fg(Color::DarkGray)));
    }
    wrap.flush();
    wrap.lines
}

fn header_line(msg: &Message, ascii: bool) -> Line<'static> {
    let (label, color) = match msg.role {
        Role::User => ("you", Color::Blue),
        Role::Model => ("model", Color::Green),
    };
    let marker = if ascii { ">" } else { "▸" };
    let mut spans = vec![Span::styled(
        format!("{marker} {label}"),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if msg.is_error {
        spans.push(Span::styled(" (error)", Style::default().fg(Color::Red)));
    }
    Line::from(spans)
}

fn human_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

fn drop_trailing_empty<'a>(it: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut v: Vec<&str> = it.collect();
    if v.last() == Some(&"") {
        v.pop();
    }
    v
}

/// Word-wrapping line builder shared by all inline segments, so a bold span
/// continues on the same visual line as the text before it.
struct Wrapper {
    width: usize,
    lines: StyledLines,
    spans: Vec<Span<'static>>,
}

impl Wrapper {
    fn col(&self) -> usize {
        self.spans.iter().map(|s| s.content.chars().count()).sum()
    }

    /// End the current visual line, even when it is empty (a blank source
    /// line stays blank on screen).
    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.spans)));
    }

    /// End the current visual line only if it holds anything.
    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.break_line();
        }
    }

    /// Append `text` (no newlines), wrapping at word boundaries.
    fn push_wrapped(&mut self, text: &str, style: Style) {
        let mut col = self.col();
        let mut buf = String::new();
        for word in text.split_inclusive(' ') {
            let len = word.chars().count();
            if col + len > self.width && col > 0 {
                if !buf.is_empty() {
                    self.spans.push(Span::styled(std::mem::take(&mut buf), style));
                }
                self.break_line();
                col = 0;
            }
            buf.push_str(word);
            col += len;
        }
        if !buf.is_empty() {
            self.spans.push(Span::styled(buf, style));
        }
    }

    /// Append a span that must not be split (inline code with its backticks).
    fn push_atom(&mut self, text: String, style: Style) {
        let len = text.chars().count();
        if self.col() + len > self.width && self.col() > 0 {
            self.break_line();
        }
        self.spans.push(Span::styled(text, style));
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
