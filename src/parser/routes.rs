// Flask route extraction
//
// Routes are found by matching `@<name>.route(...)` and the method shortcuts
// (`@<name>.get(...)` etc.) in the source text; the decorated function's
// docstring comes from the tree-sitter analysis of the same file.

use crate::error::Result;
use crate::parser::ast::{FunctionInfo, SourceAnalysis};
use crate::parser::python::analyze_source;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static RE_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"@\w+\.(route|get|post|put|delete|patch)\(\s*["']([^"']+)["']\s*(?:,\s*methods\s*=\s*[\[(]([^\])]*)[\])])?[^)]*\)"#,
    )
    .unwrap()
});
static RE_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:async\s+)?def\s+(\w+)").unwrap());
static RE_PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:(\w+):)?(\w+)>").unwrap());

pub const DEFAULT_TITLE: &str = "API Documentation";
pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_BASE_URL: &str = "/api";

/// API description extracted from a Flask application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    pub base_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub routes: Vec<RouteInfo>,
    /// Analysis of the application module
    pub info: SourceAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub path: String,
    pub methods: Vec<String>,
    pub function: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<RouteParam>,
}

impl RouteInfo {
    /// First line of the description
    pub fn summary(&self) -> &str {
        self.description.lines().next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteParam {
    pub name: String,
    /// OpenAPI schema type
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
}

impl ApiInfo {
    /// Read and analyze a Flask application module
    pub fn from_flask_app(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::from_source(&source, path))
    }

    pub fn from_source(source: &str, path: &Path) -> Self {
        let info = analyze_source(source, path);
        let routes = extract_routes(source, &info);
        tracing::debug!("{}: {} routes", path.display(), routes.len());

        Self {
            title: DEFAULT_TITLE.to_string(),
            version: DEFAULT_VERSION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            description: info
                .info()
                .map(|i| i.module_docstring.clone())
                .unwrap_or_default(),
            routes,
            info,
        }
    }
}

/// Find route decorators and the functions they decorate
pub fn extract_routes(source: &str, analysis: &SourceAnalysis) -> Vec<RouteInfo> {
    let mut routes = Vec::new();

    for caps in RE_ROUTE.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(def) = RE_DEF.captures(&source[whole.end()..]) else {
            tracing::warn!("Route {} has no function after it", &caps[2]);
            continue;
        };
        let function = def[1].to_string();

        let methods = match (&caps[1], caps.get(3)) {
            ("route", Some(list)) => list
                .as_str()
                .split(',')
                .map(|m| m.trim().trim_matches(|c| c == '\'' || c == '"').to_uppercase())
                .filter(|m| !m.is_empty())
                .collect(),
            ("route", None) => vec!["GET".to_string()],
            (shortcut, _) => vec![shortcut.to_uppercase()],
        };

        let path = caps[2].to_string();
        routes.push(RouteInfo {
            parameters: path_params(&path),
            description: find_function(analysis, &function)
                .and_then(|f| f.docstring.clone())
                .unwrap_or_default(),
            path,
            methods,
            function,
        });
    }

    routes
}

fn find_function<'a>(analysis: &'a SourceAnalysis, name: &str) -> Option<&'a FunctionInfo> {
    let info = analysis.info()?;
    info.functions
        .iter()
        .chain(info.classes.iter().flat_map(|c| c.methods.iter()))
        .find(|f| f.name == name)
}

/// `<int:id>` style path parameters
pub fn path_params(path: &str) -> Vec<RouteParam> {
    RE_PATH_PARAM
        .captures_iter(path)
        .map(|caps| RouteParam {
            name: caps[2].to_string(),
            param_type: converter_type(caps.get(1).map(|m| m.as_str())).to_string(),
            location: "path".to_string(),
            required: true,
        })
        .collect()
}

fn converter_type(converter: Option<&str>) -> &'static str {
    match converter {
        Some("int") => "integer",
        Some("float") => "number",
        _ => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = r#""""Shop API."""
from flask import Flask

app = Flask(__name__)


@app.route("/users")
def list_users():
    """List all users.

    Returns every active account.
    """
    return []


@app.route('/users/<int:user_id>', methods=['GET', "delete"])
def user(user_id):
    return {}


@bp.post("/files/<path:name>")
async def upload(name):
    """Upload a file."""
"#;

    fn api() -> ApiInfo {
        ApiInfo::from_source(APP, Path::new("app.py"))
    }

    #[test]
    fn test_routes_found() {
        let api = api();
        let paths: Vec<_> = api.routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/users", "/users/<int:user_id>", "/files/<path:name>"]);
        assert_eq!(api.description, "Shop API.");
        assert!(api.info.is_parsed());
    }

    #[test]
    fn test_methods() {
        let api = api();
        assert_eq!(api.routes[0].methods, vec!["GET"]);
        assert_eq!(api.routes[1].methods, vec!["GET", "DELETE"]);
        assert_eq!(api.routes[2].methods, vec!["POST"]);
    }

    #[test]
    fn test_function_and_docstring() {
        let api = api();
        assert_eq!(api.routes[0].function, "list_users");
        assert_eq!(api.routes[0].summary(), "List all users.");
        assert_eq!(api.routes[1].description, "");
        assert_eq!(api.routes[2].function, "upload");
    }

    #[test]
    fn test_path_params() {
        let params = path_params("/a/<int:id>/<slug>/<float:ratio>");
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, "id");
        assert_eq!(params[0].param_type, "integer");
        assert_eq!(params[1].param_type, "string");
        assert_eq!(params[2].param_type, "number");
        assert!(params.iter().all(|p| p.required && p.location == "path"));
    }

    #[test]
    fn test_no_routes() {
        let api = ApiInfo::from_source("x = 1\n", Path::new("plain.py"));
        assert!(api.routes.is_empty());
        assert_eq!(api.title, DEFAULT_TITLE);
    }
}
