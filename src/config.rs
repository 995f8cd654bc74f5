use crate::error::{Error, Result};
use crate::template::MissPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub templates: TemplateConfig,
    pub analysis: AnalysisConfig,
    pub conversion: ConversionConfig,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

/// Template settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Word template used when a request names none
    pub word_template: Option<PathBuf>,
    /// What a placeholder without a value turns into
    pub missing_placeholder: MissPolicy,
    /// Heading of the blank document used when a template is missing
    pub fallback_heading: String,
}

/// Source analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
}

/// Optional document-to-PDF conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub enabled: bool,
    pub command: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            word_template: None,
            missing_placeholder: MissPolicy::Empty,
            fallback_heading: "Document".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".py".to_string()],
            exclude: vec![
                "venv/**".to_string(),
                ".venv/**".to_string(),
                "**/__pycache__/**".to_string(),
                ".git/**".to_string(),
            ],
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: "soffice".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Extensions normalized to the bare form (`py`, not `.py`)
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    tracing::warn!("Ignoring config {}: {}", path.display(), e);
                }
                Self::default()
            }
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        output: Option<PathBuf>,
        extensions: Vec<String>,
        exclude: Vec<String>,
        keep_missing: bool,
        convert_pdf: bool,
    ) {
        if let Some(out) = output {
            self.output.directory = out;
        }

        if !extensions.is_empty() {
            self.analysis.extensions = extensions;
        }

        if !exclude.is_empty() {
            self.analysis.exclude.extend(exclude);
        }

        if keep_missing {
            self.templates.missing_placeholder = MissPolicy::Preserve;
        }

        if convert_pdf {
            self.conversion.enabled = true;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.analysis.normalized_extensions().is_empty() {
            return Err(Error::config_validation("at least one extension required"));
        }

        if self.output.directory.as_os_str().is_empty() {
            return Err(Error::config_validation("output directory cannot be empty"));
        }

        if self.conversion.enabled && self.conversion.command.trim().is_empty() {
            return Err(Error::config_validation(
                "conversion command required when conversion is enabled",
            ));
        }

        for pattern in &self.analysis.exclude {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }
}
