//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Generate office documents and technical docs
#[derive(Parser, Debug)]
#[command(name = "docsmith")]
#[command(about = "Generate office documents from templates and technical docs from Python code")]
#[command(version)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path (defaults to ./docsmith.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate one document (word, pdf, excel or report)
    Generate {
        /// Document type
        kind: String,

        /// JSON file with the placeholder data
        #[arg(short, long)]
        data: PathBuf,

        /// Template to fill (Word only)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Exact output file (default: unique name in the output directory)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep placeholders that have no value instead of blanking them
        #[arg(long)]
        keep_missing: bool,

        /// Convert Word output to PDF with the configured office suite
        #[arg(long)]
        convert_pdf: bool,
    },

    /// Generate every document listed in a JSON batch file
    Batch {
        /// Batch file: {"documents": [{"type", "template", "data", "output"}]}
        file: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep placeholders that have no value instead of blanking them
        #[arg(long)]
        keep_missing: bool,
    },

    /// Document a single Python file
    AnalyzeCode {
        /// Python source file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: DocFormat,

        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Document a project directory or .zip archive
    AnalyzeProject {
        /// Project directory or zip archive
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: DocFormat,

        /// File extensions to analyze (can be repeated)
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// Glob patterns to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Document the routes of a Flask application
    ApiDocs {
        /// Flask application module
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: ApiFormat,

        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Document a database schema from SQL DDL or schema JSON
    DbDocs {
        /// .sql file, or .json produced by a schema introspector
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: DbFormat,

        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Render a diagram
    Diagram {
        /// Diagram type
        #[arg(value_enum)]
        kind: DiagramKind,

        /// Input: Python file or directory, SQL/JSON schema, or JSON records
        input: PathBuf,

        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

/// Output format for code documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocFormat {
    Markdown,
    Json,
}

/// Output format for API documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApiFormat {
    Markdown,
    Openapi,
    Json,
}

/// Output format for database documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DbFormat {
    Markdown,
    Er,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiagramKind {
    /// Mermaid class diagram from Python sources
    Class,
    /// PlantUML class diagram from Python sources
    Plantuml,
    /// Mermaid flowchart from a Python file or JSON nodes
    Flowchart,
    /// Mermaid sequence diagram from JSON interactions
    Sequence,
    /// Mermaid package diagram from a project directory
    Package,
    /// Mermaid architecture diagram from JSON components
    Architecture,
    /// Mermaid ER diagram from a schema
    Er,
}
