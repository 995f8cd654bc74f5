// SQL schema extraction from CREATE TABLE / CREATE INDEX statements
//
// This is a regex-and-bracket scanner, not a SQL parser. It understands the
// common DDL shapes: inline and table-level primary keys, inline REFERENCES,
// FOREIGN KEY constraints (optionally named), UNIQUE constraints and
// CREATE [UNIQUE] INDEX statements.

use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static RE_LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"--[^\n]*").unwrap());
static RE_BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static RE_CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)CREATE\s+(?:TEMP(?:ORARY)?\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?[`"\[]?(\w+)[`"\]]?\s*\("#)
        .unwrap()
});
static RE_CREATE_INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)CREATE\s+(UNIQUE\s+)?INDEX\s+(?:IF\s+NOT\s+EXISTS\s+)?[`"\[]?(\w+)[`"\]]?\s+ON\s+[`"\[]?(\w+)[`"\]]?\s*\(([^)]*)\)"#,
    )
    .unwrap()
});
static RE_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bDEFAULT\s+('[^']*'|\([^)]*\)|[^\s,]+)").unwrap());
static RE_REFERENCES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bREFERENCES\s+[`"\[]?(\w+)[`"\]]?\s*\(([^)]*)\)"#).unwrap()
});
static RE_PRIMARY_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\s*\(([^)]*)\)").unwrap());
static RE_FOREIGN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^(?:CONSTRAINT\s+[`"\[]?(\w+)[`"\]]?\s+)?FOREIGN\s+KEY\s*\(([^)]*)\)\s*REFERENCES\s+[`"\[]?(\w+)[`"\]]?\s*\(([^)]*)\)"#)
        .unwrap()
});
static RE_UNIQUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^(?:CONSTRAINT\s+[`"\[]?(\w+)[`"\]]?\s+)?UNIQUE\s*(?:KEY\s+)?\(([^)]*)\)"#).unwrap()
});

const CONSTRAINT_KEYWORDS: &[&str] = &[
    "PRIMARY", "FOREIGN", "UNIQUE", "CONSTRAINT", "KEY", "INDEX", "CHECK",
];

/// A database schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbSchema {
    pub database: String,
    #[serde(default)]
    pub tables: Vec<TableInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub indexes: Vec<IndexInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    #[serde(default)]
    pub name: Option<String>,
    pub constrained_columns: Vec<String>,
    pub referred_table: String,
    pub referred_columns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl DbSchema {
    /// Extract a schema from a `.sql` file, named after the file stem
    pub fn from_sql_file(path: &Path) -> Result<Self> {
        let sql = std::fs::read_to_string(path)?;
        let database = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "database".to_string());
        Ok(parse_sql(&sql, &database))
    }

    /// Load a schema produced by an external introspector
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Extract tables from DDL text
///
/// A CREATE TABLE whose parentheses never close is skipped with a warning.
pub fn parse_sql(sql: &str, database: &str) -> DbSchema {
    let sql = RE_BLOCK_COMMENT.replace_all(sql, " ");
    let sql = RE_LINE_COMMENT.replace_all(&sql, "");

    let mut schema = DbSchema {
        database: database.to_string(),
        tables: Vec::new(),
    };

    for caps in RE_CREATE_TABLE.captures_iter(&sql) {
        let name = caps[1].to_string();
        let body_start = caps.get(0).map(|m| m.end()).unwrap_or_default();
        match balanced_body(&sql[body_start..]) {
            Some(body) => schema.tables.push(parse_table(name, body)),
            None => tracing::warn!("Skipping table {}: unbalanced parentheses", name),
        }
    }

    for caps in RE_CREATE_INDEX.captures_iter(&sql) {
        let table_name = &caps[3];
        let Some(table) = schema.tables.iter_mut().find(|t| t.name == table_name) else {
            tracing::debug!("Index {} refers to unknown table {}", &caps[2], table_name);
            continue;
        };
        table.indexes.push(IndexInfo {
            name: caps[2].to_string(),
            columns: split_columns(&caps[4]),
            unique: caps.get(1).is_some(),
        });
    }

    schema
}

/// Text up to the parenthesis closing an already opened one
fn balanced_body(s: &str) -> Option<&str> {
    let mut depth = 1usize;
    let mut in_quote = false;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas outside parentheses and quotes
fn split_definitions(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = depth.saturating_sub(1),
            ',' if !in_quote && depth == 0 => {
                parts.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].trim());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn unquote(name: &str) -> String {
    name.trim()
        .trim_matches(|c| matches!(c, '`' | '"' | '[' | ']'))
        .to_string()
}

fn split_columns(list: &str) -> Vec<String> {
    list.split(',')
        .map(unquote)
        .filter(|c| !c.is_empty())
        .collect()
}

fn parse_table(name: String, body: &str) -> TableInfo {
    let mut table = TableInfo {
        name,
        ..TableInfo::default()
    };

    for def in split_definitions(body) {
        let first = def
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase();

        if CONSTRAINT_KEYWORDS.contains(&first.as_str()) {
            parse_constraint(def, &mut table);
            continue;
        }

        let Some(column) = parse_column(def) else {
            tracing::debug!("Ignoring definition in {}: {}", table.name, def);
            continue;
        };

        if column.primary_key {
            table.primary_keys.push(column.name.clone());
        }
        if let Some(caps) = RE_REFERENCES.captures(def) {
            table.foreign_keys.push(ForeignKey {
                name: None,
                constrained_columns: vec![column.name.clone()],
                referred_table: caps[1].to_string(),
                referred_columns: split_columns(&caps[2]),
            });
        }
        table.columns.push(column);
    }

    for pk in &table.primary_keys {
        if let Some(column) = table.columns.iter_mut().find(|c| &c.name == pk) {
            column.primary_key = true;
            column.nullable = false;
        }
    }

    table
}

fn parse_column(def: &str) -> Option<ColumnInfo> {
    let mut tokens = def.split_whitespace();
    let name = unquote(tokens.next()?);
    let raw_type = tokens.next()?;

    // `DECIMAL(10, 2)` may have been split at the space after the comma
    let column_type = if raw_type.contains('(') && !raw_type.contains(')') {
        let start = def.find(raw_type).unwrap_or(0);
        let end = def[start..].find(')').map(|i| start + i + 1).unwrap_or(def.len());
        def[start..end].split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        raw_type.to_string()
    };

    let upper = def.to_uppercase();
    let primary_key = upper.contains("PRIMARY KEY");

    Some(ColumnInfo {
        name,
        column_type,
        nullable: !upper.contains("NOT NULL") && !primary_key,
        default: RE_DEFAULT.captures(def).map(|c| c[1].to_string()),
        primary_key,
    })
}

fn parse_constraint(def: &str, table: &mut TableInfo) {
    if let Some(caps) = RE_FOREIGN_KEY.captures(def) {
        table.foreign_keys.push(ForeignKey {
            name: caps.get(1).map(|m| m.as_str().to_string()),
            constrained_columns: split_columns(&caps[2]),
            referred_table: caps[3].to_string(),
            referred_columns: split_columns(&caps[4]),
        });
    } else if let Some(caps) = RE_UNIQUE.captures(def) {
        let columns = split_columns(&caps[2]);
        let name = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| format!("{}_{}_key", table.name, columns.join("_")));
        table.indexes.push(IndexInfo {
            name,
            columns,
            unique: true,
        });
    } else if let Some(caps) = RE_PRIMARY_KEY.captures(def) {
        for column in split_columns(&caps[1]) {
            if !table.primary_keys.contains(&column) {
                table.primary_keys.push(column);
            }
        }
    }
}
