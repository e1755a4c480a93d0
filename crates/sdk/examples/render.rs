//! Simple SDK Example
//!
//! Renders a small diagram through a running d2render daemon.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package d2render-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --package d2render-sdk --example render
//!    ```

use d2render_sdk::{RenderClient, RenderRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::var("D2RENDER_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".into());
    let client = RenderClient::connect(&url)?;

    let health = client.health().await?;
    println!("Connected to d2render v{} ({})", health.version, health.renderer);

    let request = RenderRequest::new("client -> server: POST /render\nserver -> d2: stdin")
        .option("theme", 200)
        .flag("sketch");

    let svg = client.render(&request).await?;
    std::fs::write("example.svg", &svg)?;
    println!("Wrote example.svg ({} bytes)", svg.len());

    Ok(())
}
