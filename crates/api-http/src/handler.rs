//! HTTP Route Handlers

use crate::error::ApiError;
use crate::types::{HealthResponse, RenderBody};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use d2render_core::application::RenderService;
use d2render_core::domain::SVG_CONTENT_TYPE;
use d2render_core::port::IdProvider;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

/// Response header carrying the per-request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared handler state with injected dependencies
pub struct AppState {
    service: Arc<RenderService>,
    id_provider: Arc<dyn IdProvider>,
}

impl AppState {
    pub fn new(service: Arc<RenderService>, id_provider: Arc<dyn IdProvider>) -> Self {
        Self {
            service,
            id_provider,
        }
    }
}

/// POST /render
///
/// The body is decoded by hand so that a missing or foreign Content-Type is
/// accepted and every decode failure yields the same 400 body.
pub async fn render(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request_id = state.id_provider.generate_id();
    let span = info_span!("render", request_id = %request_id);

    async move {
        let body: RenderBody =
            serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let (content, options) = body.into_parts();

        let diagram = state.service.render_json(content, options).await?;

        info!(
            bytes = diagram.len(),
            duration_ms = diagram.duration_ms,
            "Render request served"
        );

        let mut response =
            ([(header::CONTENT_TYPE, SVG_CONTENT_TYPE)], diagram.svg).into_response();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        Ok::<_, ApiError>(response)
    }
    .instrument(span)
    .await
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: d2render_core::VERSION.to_string(),
        renderer: state.service.renderer_name().to_string(),
    })
}
