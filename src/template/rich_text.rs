// Rich-content injection
//
// Converts the small HTML subset produced by the web editor (`<p>`, `<b>`,
// `<strong>`, `<i>`, `<em>`, `<u>`) into document paragraphs. Formatting is
// tracked per block: a bold tag anywhere in a `<p>` makes the whole
// paragraph bold.

use crate::document::{Block, Document, Paragraph, Run, RunFormat};
use regex::Regex;
use std::sync::LazyLock;

static RE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p\s*>").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static RE_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z]+);").unwrap());
static RE_BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<(b|strong)\b").unwrap());
static RE_ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<(i|em)\b").unwrap());
static RE_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?[a-z][a-z0-9]*(?:\s[^>]*)?/?>").unwrap());
static RE_UNDERLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<u\b").unwrap());

/// Where injected paragraphs go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    /// Add every paragraph at the end of the document
    #[default]
    Append,
    /// Replace the first `{{content}}` / `{content}` paragraph with the first
    /// block; remaining blocks are dropped
    ReplacePlaceholder,
}

/// Outcome of an injection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectReport {
    /// Paragraphs written into the document
    pub inserted: usize,
    /// Blocks produced but not written (replace mode keeps only one)
    pub dropped: usize,
    /// Mode actually applied
    pub applied: InsertMode,
    /// Replace mode found no placeholder paragraph and appended instead
    pub fell_back: bool,
}

/// Convert an HTML fragment into paragraphs, one per `<p>` block
///
/// Input without any `<p>` element is treated as a single block.
pub fn html_to_paragraphs(html: &str) -> Vec<Paragraph> {
    let blocks: Vec<&str> = RE_BLOCK
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if blocks.is_empty() {
        return vec![block_to_paragraph(html)];
    }

    blocks.into_iter().map(block_to_paragraph).collect()
}

fn block_to_paragraph(raw: &str) -> Paragraph {
    let text = plain_text(raw);
    if text.is_empty() {
        return Paragraph::new("");
    }

    let format = RunFormat {
        bold: RE_BOLD.is_match(raw),
        italic: RE_ITALIC.is_match(raw),
        underline: RE_UNDERLINE.is_match(raw),
        ..RunFormat::default()
    };

    let mut paragraph = Paragraph::new("");
    paragraph.add_run(Run::with_format(&text, format));
    paragraph
}

/// Strip tags and decode entities, trimming surrounding whitespace
pub fn plain_text(raw: &str) -> String {
    let stripped = RE_TAG.replace_all(raw, "");
    let spaced = stripped.replace("&nbsp;", " ");
    unescape(&spaced).trim().to_string()
}

/// Decode the HTML entities the editor emits plus numeric references
///
/// Unknown named entities are left as written.
pub fn unescape(text: &str) -> String {
    RE_ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn is_content_placeholder(paragraph: &Paragraph) -> bool {
    let text = paragraph.text();
    text.contains("{{content}}") || text.contains("{content}")
}

/// Insert rich content into a document
pub fn inject(doc: &mut Document, html: &str, mode: InsertMode) -> InjectReport {
    let mut paragraphs = html_to_paragraphs(html);

    if mode == InsertMode::ReplacePlaceholder {
        let target = doc.blocks.iter().position(|b| match b {
            Block::Paragraph(p) => is_content_placeholder(p),
            Block::Table(_) => false,
        });

        match target {
            Some(index) if !paragraphs.is_empty() => {
                let dropped = paragraphs.len() - 1;
                if dropped > 0 {
                    tracing::warn!(
                        "Content placeholder takes one block, dropping {} more",
                        dropped
                    );
                }
                let first = paragraphs.swap_remove(0);
                doc.blocks[index] = Block::Paragraph(first);
                return InjectReport {
                    inserted: 1,
                    dropped,
                    applied: InsertMode::ReplacePlaceholder,
                    fell_back: false,
                };
            }
            _ => {
                tracing::warn!("No content placeholder found, appending rich content instead");
                let inserted = paragraphs.len();
                for p in paragraphs {
                    doc.push_paragraph(p);
                }
                return InjectReport {
                    inserted,
                    dropped: 0,
                    applied: InsertMode::Append,
                    fell_back: true,
                };
            }
        }
    }

    let inserted = paragraphs.len();
    for p in paragraphs {
        doc.push_paragraph(p);
    }
    InjectReport {
        inserted,
        dropped: 0,
        applied: InsertMode::Append,
        fell_back: false,
    }
}

/// Whether a value looks like editor HTML rather than plain text
pub fn looks_like_html(text: &str) -> bool {
    RE_ELEMENT.is_match(text)
}
