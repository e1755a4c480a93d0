//! d2render SDK - Rust Client Library
//!
//! Provides a convenient client for the d2render HTTP service.
//!
//! # Example
//!
//! ```no_run
//! use d2render_sdk::{RenderClient, RenderRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RenderClient::connect("http://127.0.0.1:8080")?;
//!
//!     let svg = client
//!         .render(&RenderRequest::new("a -> b").option("theme", 200).flag("sketch"))
//!         .await?;
//!
//!     std::fs::write("diagram.svg", svg)?;
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::RenderClient;
pub use error::{Result, SdkError};
pub use types::{HealthResponse, RenderRequest};
