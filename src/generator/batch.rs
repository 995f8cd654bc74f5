use crate::error::Result;
use crate::generator::DocumentKind;
use crate::template::DataMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// JSON batch file: `{"documents": [{"type": ..., "data": ...}, ...]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchFile {
    #[serde(default)]
    pub documents: Vec<BatchEntry>,
}

/// One raw batch entry, as written in the file
#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub template: Option<PathBuf>,
    #[serde(default)]
    pub data: DataMap,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// A validated batch entry
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub kind: DocumentKind,
    pub template: Option<PathBuf>,
    pub data: DataMap,
    pub output: Option<PathBuf>,
}

impl BatchFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate every entry's document type
    pub fn jobs(self) -> Result<Vec<BatchJob>> {
        self.documents
            .into_iter()
            .map(|entry| {
                Ok(BatchJob {
                    kind: entry.kind.parse()?,
                    template: entry.template,
                    data: entry.data,
                    output: entry.output,
                })
            })
            .collect()
    }
}
