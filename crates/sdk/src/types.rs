//! SDK Request/Response Types
//!
//! Mirrors the HTTP types from the api-http crate.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// POST /render body
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderRequest {
    pub content: String,
    pub options: Map<String, Value>,
}

impl RenderRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            options: Map::new(),
        }
    }

    /// Add a `--key=value` option
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add a bare `--key` flag
    pub fn flag(mut self, key: impl Into<String>) -> Self {
        self.options.insert(key.into(), Value::String(String::new()));
        self
    }
}

/// GET /health response
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub renderer: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_serializes_to_wire_shape() {
        let request = RenderRequest::new("a -> b")
            .option("theme", 200)
            .option("layout", "elk")
            .flag("sketch");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "content": "a -> b",
                "options": { "theme": 200, "layout": "elk", "sketch": "" }
            })
        );
    }
}
