// Placeholder resolution
//
// Finds `{{name}}` and `{name}` tokens in paragraph text and substitutes
// values from a data map. Double-brace tokens win; a single-brace token
// touching another brace is never matched, so `{{x}}` can't be half-eaten
// by the single-brace form.

use crate::document::{Document, Paragraph, Run, RunFormat};
use crate::template::DataMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::LazyLock;

/// Point size given to a resolved run whose first original run had none
pub const DEFAULT_FONT_SIZE: f32 = 11.0;

/// What a placeholder without a value becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissPolicy {
    /// Substitute an empty string
    #[default]
    Empty,
    /// Put the original token text back
    Preserve,
}

/// Brace style of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Double,
    Single,
}

/// A placeholder occurrence in a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub name: String,
    pub kind: TokenKind,
    /// Byte range of the whole token, braces included
    pub span: Range<usize>,
}

static RE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}|\{([A-Za-z0-9_]+)\}").unwrap()
});

/// Locate every placeholder token in `text`, in order
pub fn scan(text: &str) -> Vec<Token> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();

    for caps in RE_TOKEN.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(name) = caps.get(1) {
            tokens.push(Token {
                name: name.as_str().to_string(),
                kind: TokenKind::Double,
                span: whole.range(),
            });
        } else if let Some(name) = caps.get(2) {
            let start = whole.start();
            let end = whole.end();
            // part of a brace run the double form didn't claim
            let brace_before = start > 0 && bytes[start - 1] == b'{';
            let brace_after = end < bytes.len() && bytes[end] == b'}';
            if brace_before || brace_after {
                continue;
            }
            tokens.push(Token {
                name: name.as_str().to_string(),
                kind: TokenKind::Single,
                span: whole.range(),
            });
        }
    }

    tokens
}

/// Check whether text holds at least one placeholder
pub fn has_placeholder(text: &str) -> bool {
    !scan(text).is_empty()
}

/// Substitute every placeholder in `text`
///
/// Substituted values are not rescanned, so a value that itself looks like a
/// placeholder is inserted literally.
pub fn resolve(text: &str, data: &DataMap, policy: MissPolicy) -> String {
    let tokens = scan(text);
    if tokens.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for token in tokens {
        out.push_str(&text[cursor..token.span.start]);
        match data.text(&token.name) {
            Some(value) => out.push_str(&value),
            None => match policy {
                MissPolicy::Empty => {}
                MissPolicy::Preserve => out.push_str(&text[token.span.clone()]),
            },
        }
        cursor = token.span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Resolve placeholders across the runs of one paragraph
///
/// Tokens may be split over several runs, so the paragraph text is resolved
/// as a whole and stored in a single run. That run takes point size and
/// font family from the first original run; every other run attribute in
/// the paragraph is dropped. Returns whether the paragraph changed.
pub fn resolve_paragraph(paragraph: &mut Paragraph, data: &DataMap, policy: MissPolicy) -> bool {
    let text = paragraph.text();
    if !has_placeholder(&text) {
        return false;
    }

    let resolved = resolve(&text, data, policy);
    let first = paragraph.runs.first().map(|r| r.format.clone()).unwrap_or_default();
    let format = RunFormat {
        size: Some(first.size.unwrap_or(DEFAULT_FONT_SIZE)),
        font: first.font,
        ..RunFormat::default()
    };

    paragraph.clear();
    paragraph.add_run(Run::with_format(&resolved, format));
    true
}

/// Resolve placeholders in body paragraphs and table cells
///
/// Returns the number of paragraphs that were rewritten.
pub fn resolve_document(doc: &mut Document, data: &DataMap, policy: MissPolicy) -> usize {
    doc.all_paragraphs_mut()
        .into_iter()
        .map(|p| resolve_paragraph(p, data, policy))
        .filter(|changed| *changed)
        .count()
}
