// Document generation service
//
// Ties the template resolver, rich-content injector and format writers
// together. The generator only holds configuration; every call builds its
// document from scratch and writes exactly one output file.

mod batch;

pub use batch::{BatchFile, BatchJob};

use crate::config::Config;
use crate::document::{self, Document, DocxPackage};
use crate::error::{Error, Result};
use crate::template::{self, rich_text, DataMap, DataValue, InsertMode};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use uuid::Uuid;

/// Table style applied to tables built without a template
pub const SCRATCH_TABLE_STYLE: &str = "LightGridAccent1";

/// Output format of a generated document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Word,
    Pdf,
    Excel,
    Report,
}

impl DocumentKind {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Word => "docx",
            DocumentKind::Pdf => "pdf",
            DocumentKind::Excel | DocumentKind::Report => "xlsx",
        }
    }

    /// Prefix of generated file names
    pub fn file_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Report => "report",
            _ => "document",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "word" | "docx" => Ok(DocumentKind::Word),
            "pdf" => Ok(DocumentKind::Pdf),
            "excel" | "xlsx" => Ok(DocumentKind::Excel),
            "report" => Ok(DocumentKind::Report),
            _ => Err(Error::UnknownDocumentType(s.to_string())),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Word => "word",
            DocumentKind::Pdf => "pdf",
            DocumentKind::Excel => "excel",
            DocumentKind::Report => "report",
        };
        write!(f, "{}", name)
    }
}

/// A file written by the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub kind: DocumentKind,
}

/// Outcome of converting a Word document to PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    Converted(PathBuf),
    /// The converter failed; the original document stands in
    Fallback { original: PathBuf, reason: String },
}

impl Conversion {
    /// The file to hand back to the caller
    pub fn path(&self) -> &Path {
        match self {
            Conversion::Converted(path) => path,
            Conversion::Fallback { original, .. } => original,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, Conversion::Converted(_))
    }
}

/// Unique output name: `<prefix>_<YYYYMMDD_HHMMSS>_<8 hex>.<ext>`
pub fn unique_file_name(prefix: &str, extension: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let id = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.{}", prefix, timestamp, &id[..8], extension)
}

/// Stateless document generation service
#[derive(Debug, Clone, Default)]
pub struct DocumentGenerator {
    config: Config,
}

impl DocumentGenerator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fresh path in the output directory for a new document
    pub fn output_path(&self, kind: DocumentKind) -> PathBuf {
        self.config
            .output
            .directory
            .join(unique_file_name(kind.file_prefix(), kind.extension()))
    }

    /// Blank document used when a template is unavailable
    pub fn default_template(&self) -> Document {
        let mut doc = Document::new();
        doc.add_heading(&self.config.templates.fallback_heading, 0);
        doc.add_paragraph("{{content}}");
        doc
    }

    /// Open a Word template, falling back to the blank default when missing
    pub fn load_template(&self, template: Option<&Path>) -> Result<DocxPackage> {
        let template = template.or(self.config.templates.word_template.as_deref());
        match template {
            Some(path) if path.exists() => DocxPackage::open(path),
            Some(path) => {
                tracing::warn!(
                    "Template {} not found, using blank document",
                    path.display()
                );
                Ok(DocxPackage::new(self.default_template()))
            }
            None => {
                tracing::debug!("No template given, using blank document");
                Ok(DocxPackage::new(self.default_template()))
            }
        }
    }

    /// Resolve placeholders and rich content into an opened template
    ///
    /// HTML in the `content` value replaces the content placeholder
    /// paragraph; every other placeholder is then resolved under the
    /// configured miss policy.
    pub fn fill(&self, doc: &mut Document, data: &DataMap) {
        if let Some(DataValue::Scalar(content)) = data.get("content") {
            let content = content.to_string();
            if rich_text::looks_like_html(&content) {
                let report = rich_text::inject(doc, &content, InsertMode::ReplacePlaceholder);
                tracing::debug!(
                    "Injected {} rich paragraph(s), {} dropped",
                    report.inserted,
                    report.dropped
                );
            }
        }

        let policy = self.config.templates.missing_placeholder;
        let changed = template::resolve_document(doc, data, policy);
        tracing::debug!("Resolved placeholders in {} paragraph(s)", changed);
    }

    /// Fill a Word template and write the result
    pub fn fill_template(&self, template: Option<&Path>, data: &DataMap) -> Result<GeneratedFile> {
        self.fill_template_to(template, data, self.output_path(DocumentKind::Word))
    }

    fn fill_template_to(
        &self,
        template: Option<&Path>,
        data: &DataMap,
        output: PathBuf,
    ) -> Result<GeneratedFile> {
        require_data(data)?;
        let mut package = self.load_template(template)?;
        self.fill(&mut package.document, data);
        package.save(&output)?;
        tracing::info!("Generated {}", output.display());
        Ok(GeneratedFile {
            path: output,
            kind: DocumentKind::Word,
        })
    }

    /// Build a document from `title`, `content` and `table_data`
    ///
    /// A list under `content` becomes bullet paragraphs and HTML is injected
    /// as rich paragraphs.
    pub fn build_from_scratch(&self, data: &DataMap) -> Document {
        let mut doc = Document::new();

        if let Some(title) = data.text("title") {
            doc.add_heading(&title, 0);
        }

        match data.get("content") {
            Some(DataValue::List(items)) => {
                for item in items {
                    doc.add_paragraph(&item.to_string()).style = Some("ListBullet".to_string());
                }
            }
            Some(value) => {
                let text = value.inline_text();
                if rich_text::looks_like_html(&text) {
                    rich_text::inject(&mut doc, &text, InsertMode::Append);
                } else {
                    doc.add_paragraph(&text);
                }
            }
            None => {}
        }

        if let Some(rows) = data.table("table_data") {
            doc.add_table(&rows, Some(SCRATCH_TABLE_STYLE));
        }

        doc
    }

    /// Create a Word document without a template
    pub fn create_from_scratch(&self, data: &DataMap) -> Result<GeneratedFile> {
        self.create_from_scratch_to(data, self.output_path(DocumentKind::Word))
    }

    fn create_from_scratch_to(&self, data: &DataMap, output: PathBuf) -> Result<GeneratedFile> {
        require_data(data)?;
        let package = DocxPackage::new(self.build_from_scratch(data));
        package.save(&output)?;
        tracing::info!("Generated {}", output.display());
        Ok(GeneratedFile {
            path: output,
            kind: DocumentKind::Word,
        })
    }

    /// Draw a PDF from `title`, `date`, `content`, `table_data`, `signature`
    pub fn generate_pdf(&self, data: &DataMap) -> Result<GeneratedFile> {
        self.generate_pdf_to(data, self.output_path(DocumentKind::Pdf))
    }

    fn generate_pdf_to(&self, data: &DataMap, output: PathBuf) -> Result<GeneratedFile> {
        require_data(data)?;
        let title = data.text("title").unwrap_or_else(|| "Document".to_string());
        document::write_pdf(&document::layout_document(data), &title, &output)?;
        tracing::info!("Generated {}", output.display());
        Ok(GeneratedFile {
            path: output,
            kind: DocumentKind::Pdf,
        })
    }

    /// Write a spreadsheet from `title`, `table_data` and `additional_data`
    ///
    /// Existing workbooks are not edited: a template, if given, is ignored
    /// and a fresh workbook is built.
    pub fn generate_excel(&self, template: Option<&Path>, data: &DataMap) -> Result<GeneratedFile> {
        self.generate_excel_to(template, data, self.output_path(DocumentKind::Excel))
    }

    fn generate_excel_to(
        &self,
        template: Option<&Path>,
        data: &DataMap,
        output: PathBuf,
    ) -> Result<GeneratedFile> {
        require_data(data)?;
        if let Some(path) = template {
            tracing::warn!(
                "Spreadsheet template {} ignored, building a new workbook",
                path.display()
            );
        }
        document::write_workbook(&document::table_sheet(data), &output)?;
        tracing::info!("Generated {}", output.display());
        Ok(GeneratedFile {
            path: output,
            kind: DocumentKind::Excel,
        })
    }

    /// Write the financial report workbook
    pub fn create_report(&self, data: &DataMap) -> Result<GeneratedFile> {
        self.create_report_to(data, self.output_path(DocumentKind::Report))
    }

    fn create_report_to(&self, data: &DataMap, output: PathBuf) -> Result<GeneratedFile> {
        require_data(data)?;
        document::write_workbook(&document::report_sheet(data), &output)?;
        tracing::info!("Generated {}", output.display());
        Ok(GeneratedFile {
            path: output,
            kind: DocumentKind::Report,
        })
    }

    /// Generate one document of any kind
    ///
    /// Word documents fill a template when one is given (or configured) and
    /// are built from scratch otherwise.
    pub fn generate(
        &self,
        kind: DocumentKind,
        template: Option<&Path>,
        data: &DataMap,
        output: Option<PathBuf>,
    ) -> Result<GeneratedFile> {
        let output = output.unwrap_or_else(|| self.output_path(kind));
        match kind {
            DocumentKind::Word => {
                let has_template =
                    template.is_some() || self.config.templates.word_template.is_some();
                if has_template {
                    self.fill_template_to(template, data, output)
                } else {
                    self.create_from_scratch_to(data, output)
                }
            }
            DocumentKind::Pdf => self.generate_pdf_to(data, output),
            DocumentKind::Excel => self.generate_excel_to(template, data, output),
            DocumentKind::Report => self.create_report_to(data, output),
        }
    }

    /// Run one batch job
    pub fn run_job(&self, job: &BatchJob) -> Result<GeneratedFile> {
        self.generate(
            job.kind,
            job.template.as_deref(),
            &job.data,
            job.output.clone(),
        )
    }

    /// Generate every document listed in a JSON batch file
    ///
    /// All entries are validated before anything is written, so an unknown
    /// document type aborts the whole batch.
    pub fn generate_from_config(&self, path: &Path) -> Result<Vec<GeneratedFile>> {
        let jobs = BatchFile::load(path)?.jobs()?;
        jobs.iter().map(|job| self.run_job(job)).collect()
    }

    /// Convert a Word document to PDF with the configured office suite
    ///
    /// Conversion failure is not an error: the original document is
    /// returned in its place.
    pub fn convert_to_pdf(&self, docx: &Path) -> Conversion {
        match self.run_converter(docx) {
            Ok(pdf) => {
                tracing::info!("Converted {} to PDF", docx.display());
                Conversion::Converted(pdf)
            }
            Err(e) => {
                tracing::warn!("PDF conversion failed, keeping {}: {}", docx.display(), e);
                Conversion::Fallback {
                    original: docx.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        }
    }

    fn run_converter(&self, docx: &Path) -> Result<PathBuf> {
        let command = &self.config.conversion.command;
        let outdir = match docx.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let output = Command::new(command)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(&outdir)
            .arg(docx)
            .output()
            .map_err(|e| Error::external_tool(format!("{}: {}", command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::external_tool(format!(
                "{} exited with {}: {}",
                command,
                output.status,
                stderr.trim()
            )));
        }

        let pdf = outdir.join(docx.with_extension("pdf").file_name().unwrap_or_default());
        if !pdf.exists() {
            return Err(Error::external_tool(format!(
                "{} produced no {}",
                command,
                pdf.display()
            )));
        }
        Ok(pdf)
    }
}

fn require_data(data: &DataMap) -> Result<()> {
    if data.is_empty() {
        return Err(Error::NoData);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MissPolicy;
    use tempfile::TempDir;

    fn generator(dir: &TempDir) -> DocumentGenerator {
        let mut config = Config::default();
        config.output.directory = dir.path().to_path_buf();
        DocumentGenerator::new(config)
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("word".parse::<DocumentKind>().unwrap(), DocumentKind::Word);
        assert_eq!("XLSX".parse::<DocumentKind>().unwrap(), DocumentKind::Excel);
        let err = "odt".parse::<DocumentKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownDocumentType(_)));
    }

    #[test]
    fn test_unique_file_name_shape() {
        let name = unique_file_name("document", "docx");
        let parts: Vec<&str> = name.trim_end_matches(".docx").split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "document");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(parts[3].len(), 8);
        assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(name, unique_file_name("document", "docx"));
    }

    #[test]
    fn test_fill_missing_template_uses_default() {
        let dir = TempDir::new().unwrap();
        let gen = generator(&dir);
        let data = DataMap::new().with("content", "Hello");
        let file = gen
            .fill_template(Some(Path::new("/nonexistent/template.docx")), &data)
            .unwrap();

        let doc = DocxPackage::open(&file.path).unwrap().document;
        assert_eq!(doc.text(), "Document\nHello");
    }

    #[test]
    fn test_fill_soft_policy_empties_missing_keys() {
        let gen = DocumentGenerator::default();
        let mut doc = Document::new();
        doc.add_paragraph("Client: {{client_name}}; ref {{missing}}.");
        gen.fill(&mut doc, &DataMap::new().with("client_name", "ACME"));
        assert_eq!(doc.text(), "Client: ACME; ref .");
    }

    #[test]
    fn test_fill_preserve_policy() {
        let mut config = Config::default();
        config.templates.missing_placeholder = MissPolicy::Preserve;
        let gen = DocumentGenerator::new(config);
        let mut doc = Document::new();
        doc.add_paragraph("{{missing}} {x}");
        gen.fill(&mut doc, &DataMap::new().with("x", "1"));
        assert_eq!(doc.text(), "{{missing}} 1");
    }

    #[test]
    fn test_fill_html_content_replaces_placeholder() {
        let gen = DocumentGenerator::default();
        let mut doc = gen.default_template();
        let data = DataMap::new().with("content", "<p><strong>Hi</strong> there</p>");
        gen.fill(&mut doc, &data);

        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[1].text(), "Hi there");
        assert!(paragraphs[1].runs[0].format.bold);
    }

    #[test]
    fn test_build_from_scratch() {
        let gen = DocumentGenerator::default();
        let data = DataMap::from_json_str(
            r#"{
                "title": "Contract",
                "content": ["First", "Second"],
                "table_data": [["Item", "Price"], ["Pen", 2]]
            }"#,
        )
        .unwrap();
        let doc = gen.build_from_scratch(&data);

        let styles: Vec<_> = doc.paragraphs().map(|p| p.style.clone()).collect();
        assert_eq!(
            styles,
            vec![
                Some("Title".to_string()),
                Some("ListBullet".to_string()),
                Some("ListBullet".to_string())
            ]
        );
        let table = doc.tables().next().unwrap();
        assert_eq!(table.style.as_deref(), Some(SCRATCH_TABLE_STYLE));
        assert_eq!(table.grid()[1], vec!["Pen".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_no_data_is_terminal() {
        let dir = TempDir::new().unwrap();
        let gen = generator(&dir);
        let err = gen.create_from_scratch(&DataMap::new()).unwrap_err();
        assert!(matches!(err, Error::NoData));
        assert!(gen.generate_pdf(&DataMap::new()).is_err());
        assert!(gen.create_report(&DataMap::new()).is_err());
    }

    #[test]
    fn test_generate_each_kind() {
        let dir = TempDir::new().unwrap();
        let gen = generator(&dir);
        let data = DataMap::new().with("title", "T").with("content", "Body");

        for kind in [
            DocumentKind::Word,
            DocumentKind::Pdf,
            DocumentKind::Excel,
            DocumentKind::Report,
        ] {
            let file = gen.generate(kind, None, &data, None).unwrap();
            assert_eq!(file.kind, kind);
            assert!(file.path.exists());
            assert!(file.path.starts_with(dir.path()));
            assert_eq!(
                file.path.extension().unwrap().to_str().unwrap(),
                kind.extension()
            );
        }
    }

    #[test]
    fn test_explicit_output_path() {
        let dir = TempDir::new().unwrap();
        let gen = generator(&dir);
        let out = dir.path().join("sub").join("custom.pdf");
        let file = gen
            .generate(
                DocumentKind::Pdf,
                None,
                &DataMap::new().with("title", "x"),
                Some(out.clone()),
            )
            .unwrap();
        assert_eq!(file.path, out);
        assert!(out.exists());
    }

    #[test]
    fn test_convert_to_pdf_falls_back() {
        let mut config = Config::default();
        config.conversion.command = "/nonexistent/soffice".to_string();
        let gen = DocumentGenerator::new(config);
        let conversion = gen.convert_to_pdf(Path::new("/tmp/doc.docx"));
        assert!(!conversion.is_converted());
        assert_eq!(conversion.path(), Path::new("/tmp/doc.docx"));
        match conversion {
            Conversion::Fallback { reason, .. } => assert!(reason.contains("External tool")),
            Conversion::Converted(_) => panic!("conversion cannot succeed"),
        }
    }
}
