// Source parsing: Python analysis, docstrings, SQL schemas and Flask routes

pub mod ast;
pub mod docstring;
mod python;
pub mod routes;
pub mod sql;

pub use ast::*;
pub use docstring::DocSections;
pub use python::{analyze_file, analyze_source, clean_docstring, PythonParser};
pub use routes::{ApiInfo, RouteInfo, RouteParam};
pub use sql::{parse_sql, ColumnInfo, DbSchema, ForeignKey, IndexInfo, TableInfo};
