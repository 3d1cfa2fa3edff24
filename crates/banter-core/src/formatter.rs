// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
//! Incremental markdown formatter.
//!
//! Converts a raw text string — partial or complete — into an ordered list
//! of renderable segments.  The caller feeds it the *complete accumulated*
//! message text on every render, never a delta: a fence or bold pair split
//! across two stream chunks parses correctly once both chunks have arrived,
//! at the cost of re-scanning the whole message each time.  Message lengths
//! are bounded by model output, so the re-scan is cheap.
//!
//! The scan is an explicit tokenizer rather than regex splitting: a fence
//! pass over the whole string, then a bold pass and an inline-code pass over
//! each plain-text run.  Markers without a closing counterpart (an opening
//! fence whose closer the stream has not delivered yet, a lone `**`, a lone
//! backtick) fall through as literal text until the closer arrives.  Bold
//! and inline-code spans never cross a line break.

/// One renderable piece of a formatted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, whitespace preserved.
    Text(String),
    /// A `**bold**` span.
    Bold(String),
    /// A `` `code` `` span.
    InlineCode(String),
    /// A fenced code block.  `language` defaults to `"text"` when the fence
    /// carries no tag.
    CodeBlock { language: String, code: String },
}

/// Format `input` as it stands right now.
///
/// Pure function of the string: no state is retained between calls and the
/// same input always yields the same segment list.
pub fn format_text(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut search = 0;

    while let Some(off) = input[search..].find("```") {
        let open = search + off;
        match parse_fence(input, open) {
            Some(fence) => {
                push_inline(&mut segments, &input[plain_start..open]);
                segments.push(Segment::CodeBlock {
                    language: fence.language,
                    code: fence.code,
                });
                plain_start = fence.end;
                search = fence.end;
            }
            // Incomplete fence: leave the backticks as literal text and keep
            // scanning after them.
            None => search = open + 3,
        }
    }

    push_inline(&mut segments, &input[plain_start..]);
    segments
}

struct Fence {
    language: String,
    code: String,
    /// Byte offset just past the closing backticks.
    end: usize,
}

/// Try to match a complete fenced block at `open` (which points at "```"):
/// optional word-character language tag, a newline, the body, and a closing
/// "```".  Returns `None` while any piece is still missing.
fn parse_fence(input: &str, open: usize) -> Option<Fence> {
    let after_ticks = open + 3;
    let rest = &input[after_ticks..];

    let tag_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    if !rest[tag_len..].starts_with('\n') {
        return None;
    }

    let body_start = after_ticks + tag_len + 1;
    let close = input[body_start..].find("```")? + body_start;

    let tag = &rest[..tag_len];
    Some(Fence {
        language: if tag.is_empty() { "text".into() } else { tag.into() },
        code: input[body_start..close].to_string(),
        end: close + 3,
    })
}

/// Bold pass over a plain-text run; non-bold stretches go to the code pass.
fn push_inline(segments: &mut Vec<Segment>, text: &str) {
    let mut plain_start = 0;
    let mut search = 0;

    while let Some(off) = text[search..].find("**") {
        let open = search + off;
        match find_span_close(text, open + 2, "**") {
            Some(close) => {
                push_code(segments, &text[plain_start..open]);
                segments.push(Segment::Bold(text[open + 2..close].to_string()));
                plain_start = close + 2;
                search = close + 2;
            }
            None => search = open + 2,
        }
    }

    push_code(segments, &text[plain_start..]);
}

/// Inline-code pass; whatever remains is literal text.
///
/// A run of three or more backticks is an incomplete fence remnant, not an
/// inline-code delimiter; it is skipped whole so a fence whose closer has
/// not streamed in yet stays literal instead of degrading into empty code
/// spans.
fn push_code(segments: &mut Vec<Segment>, text: &str) {
    let mut plain_start = 0;
    let mut search = 0;

    while let Some(off) = text[search..].find('`') {
        let open = search + off;
        let run = text[open..].bytes().take_while(|b| *b == b'`').count();
        if run >= 3 {
            search = open + run;
            continue;
        }
        match find_span_close(text, open + 1, "`") {
            Some(close) => {
                push_text(segments, &text[plain_start..open]);
                segments.push(Segment::InlineCode(text[open + 1..close].to_string()));
                plain_start = close + 1;
                search = close + 1;
            }
            None => search = open + 1,
        }
    }

    push_text(segments, &text[plain_start..]);
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
}

/// Closing delimiter for a span opened at `from`.  Spans never cross a line
/// break, so the search stops at the next newline.
fn find_span_close(text: &str, from: usize, delim: &str) -> Option<usize> {
    let stop = text[from..]
        .find('\n')
        .map(|i| from + i)
        .unwrap_or(text.len());
    text[from..stop].find(delim).map(|i| from + i)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
