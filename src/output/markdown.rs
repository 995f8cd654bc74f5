// Markdown documentation rendering

use crate::analysis::DirectoryAnalysis;
use crate::parser::{ApiInfo, ClassInfo, DbSchema, DocSections, FunctionInfo, SourceAnalysis};

/// Code documentation for one analyzed file
pub fn render_markdown(analysis: &SourceAnalysis) -> String {
    let info = match analysis {
        SourceAnalysis::Parsed(info) => info,
        SourceAnalysis::Failed(failure) => {
            return format!("*Analysis failed: {}*\n\n", failure.error);
        }
    };

    let mut md = String::from("# Code Documentation\n\n");
    md.push_str(&format!("**File:** `{}`\n\n", info.file.display()));

    if !info.module_docstring.is_empty() {
        md.push_str(&format!("{}\n\n", info.module_docstring));
    }

    md.push_str(&format!("**Lines of code:** {}\n\n", info.line_count));

    if !info.imports.is_empty() {
        md.push_str("## Imports\n\n");
        for import in &info.imports {
            md.push_str(&format!("- `{}`\n", import));
        }
        md.push('\n');
    }

    if !info.classes.is_empty() {
        md.push_str("## Classes\n\n");
        for class in &info.classes {
            md.push_str(&class_section(class));
            md.push('\n');
        }
    }

    if !info.functions.is_empty() {
        md.push_str("## Functions\n\n");
        for func in &info.functions {
            md.push_str(&function_section(func));
            md.push('\n');
        }
    }

    md
}

fn class_section(class: &ClassInfo) -> String {
    let mut md = format!("### {}\n\n", class.name);

    if let Some(doc) = &class.docstring {
        md.push_str(&format!("{}\n\n", doc));
    }
    if !class.bases.is_empty() {
        md.push_str(&format!("**Inherits from:** {}\n\n", class.bases.join(", ")));
    }
    if !class.decorators.is_empty() {
        md.push_str(&format!("**Decorators:** {}\n\n", class.decorators.join(", ")));
    }

    if !class.attributes.is_empty() {
        md.push_str("**Attributes:**\n\n");
        for attr in &class.attributes {
            md.push_str(&format!("- `{}`\n", attr));
        }
        md.push('\n');
    }

    if !class.methods.is_empty() {
        md.push_str("**Methods:**\n\n");
        for method in &class.methods {
            md.push_str(&format!("- `{}({})`\n", method.name, method.arg_list()));
        }
        md.push('\n');
    }

    md
}

fn function_section(func: &FunctionInfo) -> String {
    let mut md = format!("### {}\n\n", func.name);

    let Some(doc) = &func.docstring else {
        md.push_str(&format!("```python\n{}:\n    ...\n```\n\n", func.signature()));
        return md;
    };

    let sections = DocSections::parse(doc);

    if !sections.description.is_empty() {
        md.push_str(&format!("{}\n\n", sections.description));
    }

    if !func.args.is_empty() {
        md.push_str("**Parameters:**\n\n");
        md.push_str("| Name | Type | Default | Description |\n");
        md.push_str("|------|------|---------|-------------|\n");
        for arg in &func.args {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                cell(&arg.name),
                cell(arg.annotation.as_deref().unwrap_or("Any")),
                cell(arg.default.as_deref().unwrap_or_default()),
                cell(sections.arg(&arg.name).unwrap_or_default())
            ));
        }
        md.push('\n');
    }

    if func.returns.is_some() || !sections.returns.is_empty() {
        match &func.returns {
            Some(returns) => md.push_str(&format!("**Returns:** `{}`\n\n", returns)),
            None => md.push_str("**Returns:**\n\n"),
        }
        if !sections.returns.is_empty() {
            md.push_str(&format!("{}\n\n", sections.returns));
        }
    }

    if !sections.raises.is_empty() {
        md.push_str("**Raises:**\n\n");
        for (exc, desc) in &sections.raises {
            md.push_str(&format!("- `{}`: {}\n", exc, desc));
        }
        md.push('\n');
    }

    if !sections.examples.is_empty() {
        md.push_str(&format!("**Example:**\n\n```python\n{}\n```\n\n", sections.examples));
    }

    md
}

/// Project documentation: summary, then every file
pub fn render_project_markdown(analysis: &DirectoryAnalysis) -> String {
    let mut md = String::from("# Project Documentation\n\n");
    md.push_str(&format!("**Directory:** `{}`\n\n", analysis.directory.display()));

    let summary = &analysis.summary;
    md.push_str("**Summary:**\n");
    md.push_str(&format!("- Total files: {}\n", summary.total_files));
    md.push_str(&format!("- Total classes: {}\n", summary.total_classes));
    md.push_str(&format!("- Total functions: {}\n", summary.total_functions));
    md.push_str(&format!("- Total lines: {}\n\n", summary.total_lines));
    md.push_str("---\n\n");

    if analysis.files.is_empty() {
        md.push_str("*No source files found*\n\n");
        return md;
    }

    for file in &analysis.files {
        md.push_str(&format!("## {}\n\n", file.file().display()));
        md.push_str(&render_markdown(file));
        md.push_str("\n---\n\n");
    }

    md
}

/// Database documentation
pub fn render_db_markdown(schema: &DbSchema) -> String {
    let mut md = format!("# Database Documentation: {}\n\n", schema.database);
    md.push_str(&format!("## Tables ({})\n\n", schema.tables.len()));

    for table in &schema.tables {
        md.push_str(&format!("### {}\n\n", table.name));

        md.push_str("**Columns:**\n\n");
        md.push_str("| Column | Type | Nullable | Primary Key | Default |\n");
        md.push_str("|--------|------|----------|-------------|---------|\n");
        for col in &table.columns {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                cell(&col.name),
                cell(&col.column_type),
                yes_no(col.nullable),
                yes_no(col.primary_key),
                cell(col.default.as_deref().unwrap_or_default())
            ));
        }
        md.push('\n');

        if !table.foreign_keys.is_empty() {
            md.push_str("**Foreign Keys:**\n\n");
            for fk in &table.foreign_keys {
                let name = fk
                    .name
                    .as_deref()
                    .map(|n| format!("`{}`: ", n))
                    .unwrap_or_default();
                md.push_str(&format!(
                    "- {}{} -> {}({})\n",
                    name,
                    fk.constrained_columns.join(", "),
                    fk.referred_table,
                    fk.referred_columns.join(", ")
                ));
            }
            md.push('\n');
        }

        if !table.indexes.is_empty() {
            md.push_str("**Indexes:**\n\n");
            for index in &table.indexes {
                md.push_str(&format!(
                    "- `{}` ({}){}\n",
                    index.name,
                    index.columns.join(", "),
                    if index.unique { " unique" } else { "" }
                ));
            }
            md.push('\n');
        }

        md.push_str("---\n\n");
    }

    md
}

/// API endpoint documentation
pub fn render_api_markdown(api: &ApiInfo) -> String {
    let mut md = format!("# {}\n\n", api.title);
    md.push_str(&format!("**Version:** {}\n\n", api.version));
    md.push_str(&format!("**Base URL:** `{}`\n\n", api.base_url));

    if !api.description.is_empty() {
        md.push_str(&format!("{}\n\n", api.description));
    }

    md.push_str("## Endpoints\n\n");

    for route in &api.routes {
        md.push_str(&format!("### {} {}\n\n", route.methods.join(", "), route.path));

        if !route.description.is_empty() {
            md.push_str(&format!("{}\n\n", route.description));
        }

        if !route.parameters.is_empty() {
            md.push_str("**Parameters:**\n\n");
            md.push_str("| Name | Type | Location | Required |\n");
            md.push_str("|------|------|----------|----------|\n");
            for param in &route.parameters {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    param.name,
                    param.param_type,
                    param.location,
                    yes_no(param.required)
                ));
            }
            md.push('\n');
        }

        md.push_str("---\n\n");
    }

    md
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Escape a value for a table cell
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisSummary;
    use crate::parser::analyze_source;
    use std::path::{Path, PathBuf};

    const SOURCE: &str = r#""""Billing helpers."""
import os
from .models import Invoice as Inv

class Ledger(Base):
    """Keeps entries."""
    total = 0

    def add(self, amount):
        pass

def charge(amount: int, currency="EUR") -> bool:
    """Charge a customer.

    Args:
        amount: Sum in cents.
        currency (str): ISO code.

    Returns:
        True on success.

    Raises:
        ValueError: If amount is negative.

    Example:
        charge(100)
    """
    return True

def bare(x, *rest):
    pass
"#;

    fn rendered() -> String {
        render_markdown(&analyze_source(SOURCE, Path::new("billing.py")))
    }

    #[test]
    fn test_header_and_imports() {
        let md = rendered();
        assert!(md.starts_with("# Code Documentation\n\n**File:** `billing.py`\n\nBilling helpers.\n\n"));
        assert!(md.contains("**Lines of code:** 32\n\n"));
        assert!(md.contains("- `import os`\n- `from .models import Invoice as Inv`\n"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let first = rendered();
        let second = render_markdown(&analyze_source(SOURCE, Path::new("billing.py")));
        assert_eq!(first, second);
    }

    #[test]
    fn test_class_section() {
        let md = rendered();
        assert!(md.contains("### Ledger\n\nKeeps entries.\n\n**Inherits from:** Base\n\n"));
        assert!(md.contains("**Attributes:**\n\n- `total`\n"));
        assert!(md.contains("**Methods:**\n\n- `add(self, amount)`\n"));
    }

    #[test]
    fn test_function_with_docstring() {
        let md = rendered();
        assert!(md.contains("### charge\n\nCharge a customer.\n\n"));
        assert!(md.contains("| amount | int |  | Sum in cents. |\n"));
        assert!(md.contains("| currency | Any | \"EUR\" | ISO code. |\n"));
        assert!(md.contains("**Returns:** `bool`\n\nTrue on success.\n\n"));
        assert!(md.contains("- `ValueError`: If amount is negative.\n"));
        assert!(md.contains("```python\ncharge(100)\n```"));
    }

    #[test]
    fn test_function_without_docstring() {
        let md = rendered();
        assert!(md.contains("### bare\n\n```python\ndef bare(x, *rest):\n    ...\n```\n\n"));
    }

    #[test]
    fn test_failed_analysis() {
        let failed = SourceAnalysis::failed("bad.py", "syntax error at line 1, column 12");
        assert_eq!(
            render_markdown(&failed),
            "*Analysis failed: syntax error at line 1, column 12*\n\n"
        );
    }

    #[test]
    fn test_project_markdown() {
        let analysis = DirectoryAnalysis {
            directory: PathBuf::from("proj"),
            files: vec![
                analyze_source("x = 1\n", Path::new("a.py")),
                SourceAnalysis::failed("b.py", "syntax error at line 2, column 1"),
            ],
            summary: AnalysisSummary {
                total_files: 1,
                total_classes: 0,
                total_functions: 0,
                total_lines: 2,
            },
        };
        let md = render_project_markdown(&analysis);
        assert!(md.contains("- Total files: 1\n"));
        assert!(md.contains("## a.py\n\n# Code Documentation"));
        assert!(md.contains("## b.py\n\n*Analysis failed: syntax error at line 2, column 1*"));
    }

    #[test]
    fn test_empty_project() {
        let md = render_project_markdown(&DirectoryAnalysis::default());
        assert!(md.contains("*No source files found*"));
    }

    #[test]
    fn test_db_markdown() {
        let schema = crate::parser::parse_sql(
            "CREATE TABLE users (id INT PRIMARY KEY, bio TEXT DEFAULT 'n/a');\n\
             CREATE TABLE posts (id INT, author INT REFERENCES users(id));",
            "blog",
        );
        let md = render_db_markdown(&schema);
        assert!(md.starts_with("# Database Documentation: blog\n\n## Tables (2)\n\n"));
        assert!(md.contains("| id | INT | No | Yes |  |\n"));
        assert!(md.contains("| bio | TEXT | Yes | No | 'n/a' |\n"));
        assert!(md.contains("- author -> users(id)\n"));
    }

    #[test]
    fn test_api_markdown() {
        let api = ApiInfo::from_source(
            "@app.route('/items/<int:id>', methods=['GET', 'PUT'])\ndef item(id):\n    \"\"\"One item.\"\"\"\n",
            Path::new("app.py"),
        );
        let md = render_api_markdown(&api);
        assert!(md.contains("**Base URL:** `/api`\n\n## Endpoints\n\n"));
        assert!(md.contains("### GET, PUT /items/<int:id>\n\nOne item.\n\n"));
        assert!(md.contains("| id | integer | path | Yes |\n"));
    }
}
