//! CLI module for Docsmith

mod args;

pub use args::{ApiFormat, Args, Command, DbFormat, DiagramKind, DocFormat};

use crate::analysis::{Analyzer, DirectoryAnalysis};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::generator::{BatchFile, DocumentGenerator, DocumentKind};
use crate::output::{self, Component, Connection, Interaction};
use crate::parser::{self, ApiInfo, ClassInfo, DbSchema};
use crate::template::DataMap;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::path::Path;
use std::process::ExitCode;

const DEFAULT_CONFIG: &str = "docsmith.toml";

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    if let Err(e) = crate::logging::init(args.verbose) {
        eprintln!("Warning: {}", e);
    }

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Status: {}", e.status());
            ExitCode::from(e.exit_code())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if !path.exists() => Err(Error::PathNotFound(path.to_path_buf())),
        Some(path) => Config::load(path),
        None => Ok(Config::load_or_default(Path::new(DEFAULT_CONFIG))),
    }
}

fn execute(args: Args) -> Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    let verbose = args.verbose > 0;

    match args.command {
        Command::Generate {
            kind,
            data,
            template,
            out,
            output,
            keep_missing,
            convert_pdf,
        } => {
            let kind: DocumentKind = kind.parse()?;
            cfg.merge_cli(output, Vec::new(), Vec::new(), keep_missing, convert_pdf);
            cfg.validate()?;

            let data = load_data(&data)?;
            let generator = DocumentGenerator::new(cfg);
            let file = generator.generate(kind, template.as_deref(), &data, out)?;
            println!("Generated {}", file.path.display());

            if kind == DocumentKind::Word && generator.config().conversion.enabled {
                let conversion = generator.convert_to_pdf(&file.path);
                if conversion.is_converted() {
                    println!("Converted {}", conversion.path().display());
                }
            }
            Ok(())
        }

        Command::Batch {
            file,
            output,
            keep_missing,
        } => {
            cfg.merge_cli(output, Vec::new(), Vec::new(), keep_missing, false);
            cfg.validate()?;

            let jobs = BatchFile::load(&file)?.jobs()?;
            let generator = DocumentGenerator::new(cfg);
            let progress = progress_bar(jobs.len(), verbose);

            for job in &jobs {
                if let Some(pb) = &progress {
                    pb.set_message(job.kind.to_string());
                }
                let generated = generator.run_job(job)?;
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                println!("Generated {}", generated.path.display());
            }

            if let Some(pb) = progress {
                pb.finish_with_message("Batch complete");
            }
            Ok(())
        }

        Command::AnalyzeCode { file, format, out } => {
            if !file.exists() {
                return Err(Error::PathNotFound(file));
            }
            let analysis = parser::analyze_file(&file);
            let text = match format {
                DocFormat::Markdown => output::render_markdown(&analysis),
                DocFormat::Json => serde_json::to_string_pretty(&analysis)?,
            };
            emit(&text, out.as_deref())
        }

        Command::AnalyzeProject {
            path,
            format,
            extensions,
            exclude,
            out,
        } => {
            if !path.exists() {
                return Err(Error::PathNotFound(path));
            }
            cfg.merge_cli(None, extensions, exclude, false, false);
            cfg.validate()?;

            let analysis = analyze_path(&Analyzer::new(cfg).with_verbose(verbose), &path)?;
            let text = match format {
                DocFormat::Markdown => output::render_project_markdown(&analysis),
                DocFormat::Json => serde_json::to_string_pretty(&analysis)?,
            };
            emit(&text, out.as_deref())
        }

        Command::ApiDocs { file, format, out } => {
            if !file.exists() {
                return Err(Error::PathNotFound(file));
            }
            let api = ApiInfo::from_flask_app(&file)?;
            let text = match format {
                ApiFormat::Markdown => output::render_api_markdown(&api),
                ApiFormat::Openapi => output::openapi_json(&api)?,
                ApiFormat::Json => serde_json::to_string_pretty(&api)?,
            };
            emit(&text, out.as_deref())
        }

        Command::DbDocs { file, format, out } => {
            let schema = load_schema(&file)?;
            let text = match format {
                DbFormat::Markdown => output::render_db_markdown(&schema),
                DbFormat::Er => output::er_diagram(&schema),
                DbFormat::Json => serde_json::to_string_pretty(&schema)?,
            };
            emit(&text, out.as_deref())
        }

        Command::Diagram { kind, input, out } => {
            if !input.exists() {
                return Err(Error::PathNotFound(input));
            }
            let analyzer = Analyzer::new(cfg).with_verbose(verbose);
            let text = render_diagram(kind, &input, &analyzer)?;
            emit(&text, out.as_deref())
        }

        Command::Version => {
            println!("docsmith {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_data(path: &Path) -> Result<DataMap> {
    if !path.exists() {
        return Err(Error::PathNotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    DataMap::from_json_str(&contents)
}

fn load_schema(path: &Path) -> Result<DbSchema> {
    if !path.exists() {
        return Err(Error::PathNotFound(path.to_path_buf()));
    }
    match extension(path).as_str() {
        "sql" => DbSchema::from_sql_file(path),
        "json" => DbSchema::from_json_file(path),
        other => Err(Error::invalid_input(format!(
            "unsupported schema file type '{}', expected .sql or .json",
            other
        ))),
    }
}

/// Directories are walked, `.zip` files are extracted first
fn analyze_path(analyzer: &Analyzer, path: &Path) -> Result<DirectoryAnalysis> {
    if path.is_file() && extension(path) == "zip" {
        analyzer.analyze_archive(path)
    } else if path.is_dir() {
        analyzer.analyze_directory(path)
    } else {
        Err(Error::invalid_input(format!(
            "{} is neither a directory nor a .zip archive",
            path.display()
        )))
    }
}

/// Classes from one file or every file of a project
fn collect_classes(analyzer: &Analyzer, input: &Path) -> Result<Vec<ClassInfo>> {
    if input.is_file() && extension(input) != "zip" {
        let analysis = parser::analyze_file(input);
        if let Some(error) = analysis.error() {
            tracing::warn!("{}: {}", input.display(), error);
        }
        return Ok(analysis.info().map(|i| i.classes.clone()).unwrap_or_default());
    }
    let project = analyze_path(analyzer, input)?;
    Ok(project
        .files
        .iter()
        .filter_map(|f| f.info())
        .flat_map(|info| info.classes.iter().cloned())
        .collect())
}

#[derive(Debug, Default, Deserialize)]
struct FlowchartInput {
    #[serde(default)]
    nodes: Vec<String>,
    #[serde(default)]
    connections: Vec<Connection>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn render_diagram(kind: DiagramKind, input: &Path, analyzer: &Analyzer) -> Result<String> {
    Ok(match kind {
        DiagramKind::Class => output::class_diagram(&collect_classes(analyzer, input)?),
        DiagramKind::Plantuml => output::plantuml_class_diagram(&collect_classes(analyzer, input)?),
        DiagramKind::Flowchart => {
            let flow: FlowchartInput = if extension(input) == "json" {
                read_json(input)?
            } else {
                let analysis = parser::analyze_file(input);
                FlowchartInput {
                    nodes: analysis
                        .info()
                        .map(|i| i.functions.iter().map(|f| f.name.clone()).collect())
                        .unwrap_or_default(),
                    connections: Vec::new(),
                }
            };
            output::flowchart(&flow.nodes, &flow.connections)
        }
        DiagramKind::Sequence => {
            let interactions: Vec<Interaction> = read_json(input)?;
            output::sequence_diagram(&interactions)
        }
        DiagramKind::Package => {
            output::package_diagram(&output::package_modules(&analyze_path(analyzer, input)?))
        }
        DiagramKind::Architecture => {
            let components: Vec<Component> = read_json(input)?;
            output::architecture_diagram(&components)
        }
        DiagramKind::Er => output::er_diagram(&load_schema(input)?),
    })
}

/// Print to stdout or write to a file
fn emit(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, text)?;
            tracing::info!("Wrote {}", path.display());
            println!("Wrote {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn progress_bar(len: usize, verbose: bool) -> Option<ProgressBar> {
    if !verbose {
        return None;
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    Some(pb)
}
