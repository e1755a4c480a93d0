//! HTTP API Layer
//!
//! Exposes the render use case over HTTP:
//! - `POST /render`: JSON `{content, options}` in, SVG out
//! - `GET /health`: liveness and version

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use server::{HttpServer, HttpServerConfig, ServerHandle};
