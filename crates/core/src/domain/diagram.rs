// Render Request / Rendered Diagram Domain Model

use super::options::RenderOptions;

/// MIME type of everything the service returns on success
pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// A single render invocation: diagram source plus tool options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderRequest {
    /// Diagram source, piped verbatim to the tool's stdin
    pub content: String,
    pub options: RenderOptions,
}

impl RenderRequest {
    pub fn new(content: impl Into<String>, options: RenderOptions) -> Self {
        Self {
            content: content.into(),
            options,
        }
    }
}

/// Output of a successful render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    pub svg: Vec<u8>,
    pub duration_ms: i64,
}

impl RenderedDiagram {
    pub fn len(&self) -> usize {
        self.svg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.svg.is_empty()
    }
}
