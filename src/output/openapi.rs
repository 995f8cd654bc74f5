// OpenAPI 3.0.0 document from extracted Flask routes

use crate::error::Result;
use crate::parser::{ApiInfo, RouteParam};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

static RE_FLASK_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:\w+:)?(\w+)>").unwrap());

/// Build the OpenAPI document
///
/// Flask path syntax (`/users/<int:id>`) becomes `/users/{id}`. Routes that
/// share a path are merged into one path item.
pub fn openapi_spec(api: &ApiInfo) -> Value {
    let mut paths = Map::new();

    for route in &api.routes {
        let path = RE_FLASK_PARAM.replace_all(&route.path, "{${1}}").to_string();
        let item = paths
            .entry(path)
            .or_insert_with(|| Value::Object(Map::new()));

        let parameters: Vec<Value> = route.parameters.iter().map(parameter).collect();
        for method in &route.methods {
            let operation = json!({
                "summary": route.summary(),
                "description": route.description,
                "operationId": route.function,
                "parameters": parameters,
                "responses": {
                    "200": {
                        "description": "Successful response",
                        "content": {
                            "application/json": {
                                "schema": { "type": "object" }
                            }
                        }
                    }
                }
            });
            if let Some(methods) = item.as_object_mut() {
                methods.insert(method.to_lowercase(), operation);
            }
        }
    }

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": api.title,
            "version": api.version,
            "description": api.description,
        },
        "servers": [
            { "url": api.base_url, "description": "API Server" }
        ],
        "paths": paths,
    })
}

/// Pretty-printed OpenAPI JSON
pub fn openapi_json(api: &ApiInfo) -> Result<String> {
    Ok(serde_json::to_string_pretty(&openapi_spec(api))?)
}

fn parameter(param: &RouteParam) -> Value {
    json!({
        "name": param.name,
        "in": param.location,
        "required": param.required,
        "schema": { "type": param.param_type },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const APP: &str = r#"
@app.route("/users/<int:user_id>", methods=["GET", "DELETE"])
def user(user_id):
    """Fetch or delete a user.

    Deleting is permanent.
    """

@app.put("/users/<int:user_id>")
def update_user(user_id):
    pass
"#;

    #[test]
    fn test_spec_shape() {
        let api = ApiInfo::from_source(APP, Path::new("app.py"));
        let spec = openapi_spec(&api);

        assert_eq!(spec["openapi"], "3.0.0");
        assert_eq!(spec["info"]["title"], "API Documentation");
        assert_eq!(spec["servers"][0]["url"], "/api");

        let item = &spec["paths"]["/users/{user_id}"];
        assert_eq!(item["get"]["operationId"], "user");
        assert_eq!(item["get"]["summary"], "Fetch or delete a user.");
        assert_eq!(item["delete"]["operationId"], "user");
        assert_eq!(item["put"]["operationId"], "update_user");

        let param = &item["get"]["parameters"][0];
        assert_eq!(param["name"], "user_id");
        assert_eq!(param["in"], "path");
        assert_eq!(param["schema"]["type"], "integer");
        assert_eq!(param["required"], true);
    }

    #[test]
    fn test_empty_api() {
        let api = ApiInfo::from_source("", Path::new("empty.py"));
        let json = openapi_json(&api).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert!(value["paths"].as_object().unwrap().is_empty());
    }
}
