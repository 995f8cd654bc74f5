// Structured results of source analysis
//
// These types describe what the analyzer extracts from a Python file. They
// are plain values, serializable so the CLI can emit analysis as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome of analyzing one source file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SourceAnalysis {
    Parsed(SourceFileInfo),
    Failed(AnalysisFailure),
}

impl SourceAnalysis {
    /// Build a failure result
    pub fn failed(file: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        SourceAnalysis::Failed(AnalysisFailure {
            file: file.into(),
            error: error.into(),
        })
    }

    /// Path of the analyzed file
    pub fn file(&self) -> &Path {
        match self {
            SourceAnalysis::Parsed(info) => &info.file,
            SourceAnalysis::Failed(failure) => &failure.file,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, SourceAnalysis::Parsed(_))
    }

    /// Extracted info, if parsing succeeded
    pub fn info(&self) -> Option<&SourceFileInfo> {
        match self {
            SourceAnalysis::Parsed(info) => Some(info),
            SourceAnalysis::Failed(_) => None,
        }
    }

    /// Failure message, if parsing failed
    pub fn error(&self) -> Option<&str> {
        match self {
            SourceAnalysis::Parsed(_) => None,
            SourceAnalysis::Failed(failure) => Some(&failure.error),
        }
    }

    /// Point the result at a different path (e.g. relative to a project root)
    pub fn set_file(&mut self, file: PathBuf) {
        match self {
            SourceAnalysis::Parsed(info) => info.file = file,
            SourceAnalysis::Failed(failure) => failure.file = file,
        }
    }
}

/// A file that could not be analyzed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisFailure {
    pub file: PathBuf,
    pub error: String,
}

/// Everything extracted from a successfully parsed file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceFileInfo {
    pub file: PathBuf,
    /// Cleaned module docstring, empty when there is none
    pub module_docstring: String,
    /// Every class at any depth, in source order
    pub classes: Vec<ClassInfo>,
    /// Every function that is not a method, at any depth, in source order
    pub functions: Vec<FunctionInfo>,
    /// Every import statement at any depth, in source order
    pub imports: Vec<ImportInfo>,
    /// Number of newline-separated segments
    pub line_count: usize,
}

impl SourceFileInfo {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    /// Methods across all classes
    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }
}

/// A class definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClassInfo {
    pub name: String,
    pub docstring: Option<String>,
    pub line_start: usize,
    pub line_end: usize,
    /// Functions defined directly in the class body
    pub methods: Vec<FunctionInfo>,
    /// Names assigned in the class body
    pub attributes: Vec<String>,
    /// Base class expressions as dotted paths
    pub bases: Vec<String>,
    pub decorators: Vec<String>,
}

impl ClassInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// No attributes and no methods
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.attributes.is_empty()
    }

    /// Last dotted segment of each base (`models.Model` -> `Model`)
    pub fn base_names(&self) -> impl Iterator<Item = &str> {
        self.bases
            .iter()
            .map(|b| b.rsplit('.').next().unwrap_or(b.as_str()))
    }
}

/// A function or method definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FunctionInfo {
    pub name: String,
    pub docstring: Option<String>,
    pub args: Vec<ArgInfo>,
    /// Return annotation as written
    pub returns: Option<String>,
    pub line_start: usize,
    pub line_end: usize,
    pub decorators: Vec<String>,
    pub is_async: bool,
}

impl FunctionInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Argument names joined by `, ` (`self` included as written)
    pub fn arg_list(&self) -> String {
        self.args
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Python-like signature with annotations and defaults
    pub fn signature(&self) -> String {
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        let mut sig = format!(
            "{}def {}({})",
            if self.is_async { "async " } else { "" },
            self.name,
            args.join(", ")
        );
        if let Some(returns) = &self.returns {
            sig.push_str(" -> ");
            sig.push_str(returns);
        }
        sig
    }
}

/// How an argument binds
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    #[default]
    Regular,
    PositionalOnly,
    KeywordOnly,
    /// `*args`
    VarArgs,
    /// `**kwargs`
    VarKwargs,
}

/// A function argument
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArgInfo {
    pub name: String,
    pub annotation: Option<String>,
    pub default: Option<String>,
    pub kind: ArgKind,
}

impl ArgInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl fmt::Display for ArgInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            ArgKind::VarArgs => "*",
            ArgKind::VarKwargs => "**",
            _ => "",
        };
        write!(f, "{}{}", prefix, self.name)?;
        if let Some(annotation) = &self.annotation {
            write!(f, ": {}", annotation)?;
        }
        if let Some(default) = &self.default {
            if self.annotation.is_some() {
                write!(f, " = {}", default)?;
            } else {
                write!(f, "={}", default)?;
            }
        }
        Ok(())
    }
}

/// An import statement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImportInfo {
    /// `import a, b as c`
    Import { names: Vec<ImportedName>, line: usize },
    /// `from ..m import x` (module absent for `from . import x`)
    From {
        module: Option<String>,
        names: Vec<ImportedName>,
        level: usize,
        line: usize,
    },
}

impl ImportInfo {
    pub fn names(&self) -> &[ImportedName] {
        match self {
            ImportInfo::Import { names, .. } | ImportInfo::From { names, .. } => names,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ImportInfo::Import { line, .. } | ImportInfo::From { line, .. } => *line,
        }
    }
}

impl fmt::Display for ImportInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |names: &[ImportedName]| {
            names
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            ImportInfo::Import { names, .. } => write!(f, "import {}", join(names)),
            ImportInfo::From {
                module,
                names,
                level,
                ..
            } => write!(
                f,
                "from {}{} import {}",
                ".".repeat(*level),
                module.as_deref().unwrap_or(""),
                join(names)
            ),
        }
    }
}

/// A single imported name with optional alias
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
        }
    }

    pub fn with_alias(name: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: Some(alias.to_string()),
        }
    }

    /// Get the name as used in code (alias if present, otherwise original)
    pub fn used_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for ImportedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} as {}", self.name, alias),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_status_tag() {
        let failed = SourceAnalysis::failed("bad.py", "syntax error at line 1, column 4");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["file"], "bad.py");

        let parsed = SourceAnalysis::Parsed(SourceFileInfo::new("ok.py"));
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["status"], "parsed");
        assert_eq!(json["module_docstring"], "");
    }

    #[test]
    fn test_analysis_accessors() {
        let mut failed = SourceAnalysis::failed("/abs/bad.py", "boom");
        assert!(!failed.is_parsed());
        assert_eq!(failed.error(), Some("boom"));
        failed.set_file(PathBuf::from("bad.py"));
        assert_eq!(failed.file(), Path::new("bad.py"));
    }

    #[test]
    fn test_base_names() {
        let mut class = ClassInfo::new("User");
        class.bases = vec!["db.models.Model".to_string(), "Mixin".to_string()];
        assert_eq!(class.base_names().collect::<Vec<_>>(), vec!["Model", "Mixin"]);
    }

    #[test]
    fn test_signature() {
        let mut func = FunctionInfo::new("fetch");
        func.is_async = true;
        func.args = vec![
            ArgInfo::new("self"),
            ArgInfo {
                name: "url".to_string(),
                annotation: Some("str".to_string()),
                default: Some("\"/\"".to_string()),
                kind: ArgKind::Regular,
            },
            ArgInfo {
                name: "retries".to_string(),
                annotation: None,
                default: Some("3".to_string()),
                kind: ArgKind::KeywordOnly,
            },
            ArgInfo {
                name: "kwargs".to_string(),
                kind: ArgKind::VarKwargs,
                ..ArgInfo::default()
            },
        ];
        func.returns = Some("bytes".to_string());
        assert_eq!(
            func.signature(),
            "async def fetch(self, url: str = \"/\", retries=3, **kwargs) -> bytes"
        );
        assert_eq!(func.arg_list(), "self, url, retries, kwargs");
    }

    #[test]
    fn test_import_display() {
        let import = ImportInfo::Import {
            names: vec![ImportedName::new("os"), ImportedName::with_alias("numpy", "np")],
            line: 1,
        };
        assert_eq!(import.to_string(), "import os, numpy as np");

        let from = ImportInfo::From {
            module: None,
            names: vec![ImportedName::new("utils")],
            level: 1,
            line: 2,
        };
        assert_eq!(from.to_string(), "from . import utils");
        assert_eq!(from.line(), 2);
    }

    #[test]
    fn test_import_serialization_tag() {
        let from = ImportInfo::From {
            module: Some("os".to_string()),
            names: vec![ImportedName::new("path")],
            level: 0,
            line: 1,
        };
        let json = serde_json::to_value(&from).unwrap();
        assert_eq!(json["type"], "from");
        assert_eq!(json["module"], "os");
    }
}
