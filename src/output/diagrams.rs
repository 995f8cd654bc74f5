// Diagram generation
//
// Renders Mermaid (class, flowchart, sequence, package, architecture, ER)
// and PlantUML class diagrams. Every renderer is a pure function of its
// input and returns the diagram source with a trailing newline.

use crate::analysis::DirectoryAnalysis;
use crate::parser::{ClassInfo, DbSchema};
use serde::{Deserialize, Serialize};

/// An edge between two flowchart nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
}

/// One message in a sequence diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_arrow")]
    pub arrow: String,
}

fn default_arrow() -> String {
    "->".to_string()
}

/// A module and the classes it defines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageModule {
    pub name: String,
    #[serde(default)]
    pub classes: Vec<String>,
}

/// A system component for architecture diagrams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Layer the component is drawn in
    #[serde(rename = "type", default = "default_layer")]
    pub layer: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

fn default_layer() -> String {
    "other".to_string()
}

/// Mermaid class diagram
pub fn class_diagram(classes: &[ClassInfo]) -> String {
    let mut lines = vec!["classDiagram".to_string()];

    if classes.is_empty() {
        lines.push("    class Empty { }".to_string());
        return finish(lines);
    }

    for class in classes {
        lines.push(format!("    class {} {{", class.name));
        for attr in &class.attributes {
            lines.push(format!("  +{}", attr));
        }
        for method in &class.methods {
            lines.push(format!("  +{}({})", method.name, method.arg_list()));
        }
        lines.push("    }".to_string());
        lines.push(String::new());

        for base in class.base_names() {
            lines.push(format!("    {} <|-- {}", base, class.name));
        }
    }

    finish(lines)
}

/// PlantUML class diagram with the same content as [`class_diagram`]
pub fn plantuml_class_diagram(classes: &[ClassInfo]) -> String {
    let mut lines = vec!["@startuml".to_string()];

    for class in classes {
        lines.push(format!("class {} {{", class.name));
        for attr in &class.attributes {
            lines.push(format!("  + {}", attr));
        }
        for method in &class.methods {
            lines.push(format!("  + {}({})", method.name, method.arg_list()));
        }
        lines.push("}".to_string());
        lines.push(String::new());

        for base in class.base_names() {
            lines.push(format!("{} <|-- {}", base, class.name));
        }
    }

    lines.push("@enduml".to_string());
    finish(lines)
}

/// Mermaid flowchart, one node per name
pub fn flowchart(nodes: &[String], connections: &[Connection]) -> String {
    let mut lines = vec!["flowchart TD".to_string()];

    for name in nodes {
        lines.push(format!("    {}[\"{}\"]", sanitize_id(name), name));
    }
    for conn in connections {
        lines.push(format!(
            "    {} --> {}",
            sanitize_id(&conn.from),
            sanitize_id(&conn.to)
        ));
    }

    finish(lines)
}

/// Mermaid sequence diagram; participants in order of first appearance
pub fn sequence_diagram(interactions: &[Interaction]) -> String {
    let mut lines = vec!["sequenceDiagram".to_string()];

    let mut participants: Vec<&str> = Vec::new();
    for interaction in interactions {
        for name in [interaction.from.as_str(), interaction.to.as_str()] {
            if !name.is_empty() && !participants.contains(&name) {
                participants.push(name);
            }
        }
    }
    for participant in &participants {
        lines.push(format!("    participant {}", participant));
    }
    lines.push(String::new());

    for i in interactions {
        lines.push(format!("    {} {} {}: {}", i.from, i.arrow, i.to, i.message));
    }

    finish(lines)
}

/// Mermaid graph of modules and the classes they contain
pub fn package_diagram(modules: &[PackageModule]) -> String {
    let mut lines = vec!["graph TB".to_string()];

    for module in modules {
        let module_id = sanitize_id(&module.name);
        lines.push(format!("    {}[\"{}\"]", module_id, module.name));
        for class in &module.classes {
            let class_id = format!("{}_{}", module_id, sanitize_id(class));
            lines.push(format!("    {}[\"{}\"]", class_id, class));
            lines.push(format!("    {} --> {}", module_id, class_id));
        }
    }

    finish(lines)
}

/// Modules of an analyzed project, named by dotted path
pub fn package_modules(analysis: &DirectoryAnalysis) -> Vec<PackageModule> {
    analysis
        .files
        .iter()
        .filter_map(|file| file.info())
        .map(|info| {
            let relative = info
                .file
                .strip_prefix(&analysis.directory)
                .unwrap_or(&info.file);
            PackageModule {
                name: module_name(relative),
                classes: info.classes.iter().map(|c| c.name.clone()).collect(),
            }
        })
        .collect()
}

/// `pkg/sub/mod.py` -> `pkg.sub.mod`, `pkg/__init__.py` -> `pkg`
fn module_name(path: &std::path::Path) -> String {
    let mut parts: Vec<String> = path
        .with_extension("")
        .iter()
        .map(|s| s.to_string_lossy().to_string())
        .collect();
    if parts.len() > 1 && parts.last().map(String::as_str) == Some("__init__") {
        parts.pop();
    }
    parts.join(".")
}

/// Mermaid architecture graph, one subgraph per layer
pub fn architecture_diagram(components: &[Component]) -> String {
    let mut lines = vec!["graph TB".to_string()];

    let mut layers: Vec<&str> = Vec::new();
    for component in components {
        if !layers.contains(&component.layer.as_str()) {
            layers.push(&component.layer);
        }
    }

    for layer in layers {
        lines.push(format!("    subgraph {}", layer));
        for component in components.iter().filter(|c| c.layer == layer) {
            lines.push(format!(
                "        {}[\"{}\"]",
                sanitize_id(&component.name),
                component.label.as_deref().unwrap_or(&component.name)
            ));
        }
        lines.push("    end".to_string());
    }

    for component in components {
        for dep in &component.dependencies {
            lines.push(format!(
                "    {} --> {}",
                sanitize_id(&component.name),
                sanitize_id(dep)
            ));
        }
    }

    finish(lines)
}

/// Mermaid entity-relationship diagram
pub fn er_diagram(schema: &DbSchema) -> String {
    let mut lines = vec!["erDiagram".to_string()];
    let mut relationships = Vec::new();

    for table in &schema.tables {
        lines.push(format!("    {} {{", table.name));
        for column in &table.columns {
            lines.push(format!(
                "        {} {}{}",
                simplify_type(&column.column_type),
                column.name,
                if column.primary_key { " PK" } else { "" }
            ));
        }
        lines.push("    }".to_string());
        lines.push(String::new());

        for fk in &table.foreign_keys {
            relationships.push(format!(
                "    {} ||--o{{ {} : \"{} -> {}\"",
                table.name,
                fk.referred_table,
                fk.constrained_columns.first().map(String::as_str).unwrap_or_default(),
                fk.referred_columns.first().map(String::as_str).unwrap_or_default()
            ));
        }
    }

    lines.extend(relationships);
    finish(lines)
}

/// Bucket a SQL type into int, string, date, float or boolean
pub fn simplify_type(sql_type: &str) -> &'static str {
    let lower = sql_type.to_lowercase();
    if lower.contains("int") {
        "int"
    } else if lower.contains("char") || lower.contains("text") {
        "string"
    } else if lower.contains("date") || lower.contains("time") {
        "date"
    } else if ["decimal", "float", "double", "numeric", "real"]
        .iter()
        .any(|t| lower.contains(t))
    {
        "float"
    } else if lower.contains("bool") {
        "boolean"
    } else {
        "string"
    }
}

fn finish(mut lines: Vec<String>) -> String {
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Sanitize a string for use as a Mermaid node ID
fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_sql, FunctionInfo};
    use crate::parser::{ArgInfo, SourceAnalysis, SourceFileInfo};
    use std::path::{Path, PathBuf};

    fn user_class() -> ClassInfo {
        let mut class = ClassInfo::new("User");
        class.attributes = vec!["name".to_string()];
        let mut greet = FunctionInfo::new("greet");
        greet.args = vec![ArgInfo::new("self"), ArgInfo::new("other")];
        class.methods = vec![greet];
        class.bases = vec!["db.Model".to_string()];
        class
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("my.module"), "my_module");
        assert_eq!(sanitize_id("MyClass"), "MyClass");
        assert_eq!(sanitize_id("foo-bar baz"), "foo_bar_baz");
    }

    #[test]
    fn test_class_diagram_empty() {
        assert_eq!(class_diagram(&[]), "classDiagram\n    class Empty { }\n");
    }

    #[test]
    fn test_class_diagram() {
        let diagram = class_diagram(&[user_class(), ClassInfo::new("Plain")]);
        assert_eq!(
            diagram,
            "classDiagram\n    class User {\n  +name\n  +greet(self, other)\n    }\n\n    Model <|-- User\n    class Plain {\n    }\n"
        );
    }

    #[test]
    fn test_plantuml() {
        let diagram = plantuml_class_diagram(&[user_class()]);
        assert!(diagram.starts_with("@startuml\nclass User {\n  + name\n"));
        assert!(diagram.contains("  + greet(self, other)\n"));
        assert!(diagram.contains("Model <|-- User\n"));
        assert!(diagram.ends_with("@enduml\n"));
    }

    #[test]
    fn test_flowchart() {
        let diagram = flowchart(
            &["load data".to_string(), "save".to_string()],
            &[Connection {
                from: "load data".to_string(),
                to: "save".to_string(),
            }],
        );
        assert_eq!(
            diagram,
            "flowchart TD\n    load_data[\"load data\"]\n    save[\"save\"]\n    load_data --> save\n"
        );
    }

    #[test]
    fn test_sequence_participants_in_order() {
        let interactions: Vec<Interaction> = serde_json::from_str(
            r#"[{"from": "Client", "to": "Server", "message": "GET /"},
                {"from": "Server", "to": "Db", "message": "query", "arrow": "->>"}]"#,
        )
        .unwrap();
        let diagram = sequence_diagram(&interactions);
        assert!(diagram.starts_with(
            "sequenceDiagram\n    participant Client\n    participant Server\n    participant Db\n\n"
        ));
        assert!(diagram.contains("    Client -> Server: GET /\n"));
        assert!(diagram.contains("    Server ->> Db: query\n"));
    }

    #[test]
    fn test_package_diagram_from_analysis() {
        let mut info = SourceFileInfo::new("/proj/pkg/models.py");
        info.classes = vec![ClassInfo::new("User")];
        let analysis = DirectoryAnalysis {
            directory: PathBuf::from("/proj"),
            files: vec![
                SourceAnalysis::Parsed(info),
                SourceAnalysis::Parsed(SourceFileInfo::new("/proj/pkg/__init__.py")),
                SourceAnalysis::failed("/proj/bad.py", "syntax error"),
            ],
            ..DirectoryAnalysis::default()
        };

        let modules = package_modules(&analysis);
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].name, "pkg.models");
        assert_eq!(modules[1].name, "pkg");

        let diagram = package_diagram(&modules);
        assert!(diagram.contains("    pkg_models[\"pkg.models\"]\n"));
        assert!(diagram.contains("    pkg_models --> pkg_models_User\n"));
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module_name(Path::new("app.py")), "app");
        assert_eq!(module_name(Path::new("__init__.py")), "__init__");
    }

    #[test]
    fn test_architecture_layers() {
        let components: Vec<Component> = serde_json::from_str(
            r#"[{"name": "web-ui", "type": "frontend", "label": "Web UI", "dependencies": ["api"]},
                {"name": "api", "type": "backend"},
                {"name": "cron"}]"#,
        )
        .unwrap();
        let diagram = architecture_diagram(&components);
        assert!(diagram.contains("    subgraph frontend\n        web_ui[\"Web UI\"]\n    end\n"));
        assert!(diagram.contains("    subgraph other\n        cron[\"cron\"]\n    end\n"));
        assert!(diagram.ends_with("    web_ui --> api\n"));
    }

    #[test]
    fn test_er_diagram() {
        let schema = parse_sql(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, joined DATE);\n\
             CREATE TABLE orders (id INT, user_id INT, FOREIGN KEY (user_id) REFERENCES users(id));",
            "shop",
        );
        let diagram = er_diagram(&schema);
        assert!(diagram.starts_with("erDiagram\n    users {\n        int id PK\n        date joined\n    }\n"));
        assert!(diagram.ends_with("    orders ||--o{ users : \"user_id -> id\"\n"));
    }

    #[test]
    fn test_simplify_type() {
        assert_eq!(simplify_type("BIGINT"), "int");
        assert_eq!(simplify_type("VARCHAR(255)"), "string");
        assert_eq!(simplify_type("TIMESTAMP"), "date");
        assert_eq!(simplify_type("DECIMAL(10, 2)"), "float");
        assert_eq!(simplify_type("BOOLEAN"), "boolean");
        assert_eq!(simplify_type("BLOB"), "string");
    }
}
