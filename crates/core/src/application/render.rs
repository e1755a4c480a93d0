// Render Use Case

use crate::domain::{RenderOptions, RenderRequest, RenderedDiagram};
use crate::error::{AppError, Result};
use crate::port::{DiagramRenderer, TimeProvider};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Render Service: options map -> flags -> renderer -> image bytes
pub struct RenderService {
    renderer: Arc<dyn DiagramRenderer>,
    time_provider: Arc<dyn TimeProvider>,
}

impl RenderService {
    pub fn new(renderer: Arc<dyn DiagramRenderer>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            renderer,
            time_provider,
        }
    }

    /// Name of the underlying tool
    pub fn renderer_name(&self) -> &str {
        self.renderer.name()
    }

    /// Validate a raw JSON option map, then render
    ///
    /// # Errors
    /// - AppError::Validation if an option key or value is rejected
    /// - AppError::Render if the tool fails
    pub async fn render_json(
        &self,
        content: String,
        options: Map<String, Value>,
    ) -> Result<RenderedDiagram> {
        let options = RenderOptions::from_json_map(options)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.render(RenderRequest::new(content, options)).await
    }

    /// Render a validated request
    pub async fn render(&self, request: RenderRequest) -> Result<RenderedDiagram> {
        let flags = request.options.to_flags();

        info!(
            renderer = %self.renderer.name(),
            flags = ?flags,
            input_bytes = request.content.len(),
            "Start render"
        );

        let start = self.time_provider.now_millis();
        let output = self
            .renderer
            .render(request.content.as_bytes(), &flags)
            .await
            .inspect_err(|e| warn!(error = %e, "Render failed"))?;
        let duration_ms = self.time_provider.now_millis() - start;

        if !output.stderr.is_empty() {
            debug!(stderr = %output.stderr, "Renderer wrote to stderr");
        }

        info!(
            duration_ms = duration_ms,
            output_bytes = output.bytes.len(),
            exit_code = ?output.exit_code,
            "Render completed"
        );

        Ok(RenderedDiagram {
            svg: output.bytes,
            duration_ms,
        })
    }
}
