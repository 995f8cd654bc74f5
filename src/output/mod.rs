// Output generation: Markdown docs, diagrams and OpenAPI documents

pub mod diagrams;
pub mod markdown;
pub mod openapi;

pub use diagrams::*;
pub use markdown::*;
pub use openapi::*;
