// Directory and archive analysis
//
// Walks a project tree, analyzes every source file with a whitelisted
// extension and aggregates a summary over the files that parsed.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::{PythonParser, SourceAnalysis};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Result of analyzing a project directory
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DirectoryAnalysis {
    pub directory: PathBuf,
    pub files: Vec<SourceAnalysis>,
    pub summary: AnalysisSummary,
}

/// Totals over successfully parsed files
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub total_files: usize,
    pub total_classes: usize,
    pub total_functions: usize,
    pub total_lines: usize,
}

impl DirectoryAnalysis {
    fn empty(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
            ..Self::default()
        }
    }

    fn push(&mut self, analysis: SourceAnalysis) {
        if let Some(info) = analysis.info() {
            self.summary.total_files += 1;
            self.summary.total_classes += info.classes.len();
            self.summary.total_functions += info.functions.len();
            self.summary.total_lines += info.line_count;
        }
        self.files.push(analysis);
    }

    /// Files that failed to parse
    pub fn failures(&self) -> impl Iterator<Item = &SourceAnalysis> {
        self.files.iter().filter(|f| !f.is_parsed())
    }
}

/// Project analyzer
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: Config,
    verbose: bool,
}

impl Analyzer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            verbose: false,
        }
    }

    /// Show a progress bar while analyzing
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Analyze every matching file below `root`
    ///
    /// A missing root yields an empty result. Files that fail to parse are
    /// recorded as failures and never abort the walk.
    pub fn analyze_directory(&self, root: &Path) -> Result<DirectoryAnalysis> {
        let mut result = DirectoryAnalysis::empty(root);
        if !root.is_dir() {
            tracing::warn!("Directory not found: {}", root.display());
            return Ok(result);
        }

        let files = self.discover_files(root)?;
        tracing::debug!("Found {} source files in {}", files.len(), root.display());

        let mut parser = PythonParser::new()?;
        let progress = self.progress_bar(files.len());

        for path in &files {
            if let Some(pb) = &progress {
                pb.set_message(path.file_name().unwrap_or_default().to_string_lossy().to_string());
                pb.inc(1);
            }

            tracing::debug!("Analyzing {}", path.display());
            let analysis = parser.analyze_file(path);
            if let Some(error) = analysis.error() {
                tracing::warn!("{}: {}", path.display(), error);
            }
            result.push(analysis);
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Analysis complete");
        }

        Ok(result)
    }

    /// Analyze a zipped project
    ///
    /// The archive is extracted into a temporary directory that is removed
    /// when this returns. Reported paths are relative to the archive root.
    /// Entries that would escape the extraction directory are skipped.
    pub fn analyze_archive(&self, archive: &Path) -> Result<DirectoryAnalysis> {
        if !archive.is_file() {
            return Err(Error::PathNotFound(archive.to_path_buf()));
        }

        let scratch = TempDir::new()?;
        extract_archive(archive, scratch.path())?;

        let mut result = self.analyze_directory(scratch.path())?;
        result.directory = archive.to_path_buf();
        for file in &mut result.files {
            let relative = file
                .file()
                .strip_prefix(scratch.path())
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| file.file().to_path_buf());
            file.set_file(relative);
        }

        Ok(result)
    }

    /// Files with a whitelisted extension, sorted, excludes applied
    fn discover_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let extensions = self.config.analysis.normalized_extensions();
        let excludes = self
            .config
            .analysis
            .exclude
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let matches_extension = path
                .extension()
                .map(|ext| extensions.contains(&ext.to_string_lossy().to_lowercase()))
                .unwrap_or(false);
            if !matches_extension {
                continue;
            }

            let relative = path.strip_prefix(root).unwrap_or(path);
            if excludes.iter().any(|p| p.matches_path(relative)) {
                tracing::debug!("Excluded {}", relative.display());
                continue;
            }

            files.push(path.to_path_buf());
        }

        Ok(files)
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.verbose {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }
}

/// Extract a zip archive below `dest`
fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let mut zip = zip::ZipArchive::new(File::open(archive)?)?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
    }

    Ok(())
}
