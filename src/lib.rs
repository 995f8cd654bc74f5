//! Docsmith - Generate office documents and technical docs
//!
//! Fills Word templates, builds spreadsheets and PDFs from structured data,
//! and documents Python codebases as Markdown, Mermaid and OpenAPI.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod generator;
pub mod logging;
pub mod output;
pub mod parser;
pub mod template;

// Re-export main types
pub use analysis::{Analyzer, DirectoryAnalysis};
pub use config::Config;
pub use error::{Error, Result};
pub use generator::{Conversion, DocumentGenerator, DocumentKind, GeneratedFile};
pub use parser::{analyze_source, SourceAnalysis, SourceFileInfo};
pub use template::{DataMap, MissPolicy};
