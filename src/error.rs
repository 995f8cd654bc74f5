use std::path::PathBuf;
use thiserror::Error;

/// Docsmith error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),

    #[error("No data supplied for document generation")]
    NoData,

    #[error("Document error: {0}")]
    Document(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("External tool failed: {0}")]
    ExternalTool(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Docsmith operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create an input validation error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a document package error
    pub fn document(msg: impl Into<String>) -> Self {
        Error::Document(msg.into())
    }

    /// Create a PDF writer error
    pub fn pdf(msg: impl Into<String>) -> Self {
        Error::Pdf(msg.into())
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Error::Parser(msg.into())
    }

    /// Create an external tool error
    pub fn external_tool(msg: impl Into<String>) -> Self {
        Error::ExternalTool(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Machine-readable status for reporting terminal failures to callers
    pub fn status(&self) -> &'static str {
        match self {
            Error::InvalidInput(_)
            | Error::UnknownDocumentType(_)
            | Error::NoData
            | Error::PathNotFound(_)
            | Error::ConfigValidation(_) => "invalid_input",
            Error::Parser(_) | Error::ConfigParse(_) | Error::Json(_) => "parse_failure",
            Error::ExternalTool(_) => "external_tool_failure",
            _ => "internal_error",
        }
    }

    /// Process exit code for a status: 2 invalid input, 3 parse failure,
    /// 4 external tool failure, 1 anything else
    pub fn exit_code(&self) -> u8 {
        match self.status() {
            "invalid_input" => 2,
            "parse_failure" => 3,
            "external_tool_failure" => 4,
            _ => 1,
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Document(err.to_string())
    }
}
