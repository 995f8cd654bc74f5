//! Template filling: placeholder values, token resolution and rich content

pub mod data;
pub mod placeholder;
pub mod rich_text;

pub use data::{DataMap, DataValue, Scalar};
pub use placeholder::{resolve, resolve_document, resolve_paragraph, MissPolicy};
pub use rich_text::{html_to_paragraphs, inject, InjectReport, InsertMode};
