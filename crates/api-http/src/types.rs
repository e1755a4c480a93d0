//! HTTP Request/Response Types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// POST /render body
///
/// Both fields are optional; `null` is treated like an absent field.
#[derive(Debug, Default, Deserialize)]
pub struct RenderBody {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub options: Option<Map<String, Value>>,
}

impl RenderBody {
    pub fn into_parts(self) -> (String, Map<String, Value>) {
        (
            self.content.unwrap_or_default(),
            self.options.unwrap_or_default(),
        )
    }
}

/// GET /health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub renderer: String,
}
